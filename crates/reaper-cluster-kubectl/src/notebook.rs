//! Notebook name derivation from pod names

/// Name of the notebook that owns `pod_name`.
///
/// Notebook pods are named after their StatefulSet with an ordinal suffix, so
/// the trailing run of purely numeric dash-separated segments is removed.
/// Numeric segments followed by anything else are part of the name.
pub fn notebook_name(pod_name: &str) -> &str {
    let mut end = pod_name.len();

    for segment in pod_name.rsplit('-') {
        let numeric_or_empty = segment.bytes().all(|b| b.is_ascii_digit());
        if !numeric_or_empty {
            break;
        }
        // Segment plus its leading dash
        end = end.saturating_sub(segment.len() + 1);
    }

    if end == 0 {
        // Entirely numeric; keep the pod name rather than produce nothing
        return pod_name;
    }

    &pod_name[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_ordinal() {
        assert_eq!(notebook_name("my-nb-0"), "my-nb");
        assert_eq!(notebook_name("jupyter-12"), "jupyter");
    }

    #[test]
    fn strips_every_trailing_numeric_segment() {
        assert_eq!(notebook_name("nb-1-0"), "nb");
    }

    #[test]
    fn keeps_inner_numeric_segments() {
        assert_eq!(notebook_name("nb-2-a-0"), "nb-2-a");
        assert_eq!(notebook_name("llama-7b-0"), "llama-7b");
    }

    #[test]
    fn no_suffix_is_unchanged() {
        assert_eq!(notebook_name("workbench"), "workbench");
        assert_eq!(notebook_name("trainer-7f9c"), "trainer-7f9c");
    }

    #[test]
    fn all_numeric_falls_back_to_pod_name() {
        assert_eq!(notebook_name("123"), "123");
        assert_eq!(notebook_name("1-2"), "1-2");
    }
}

use std::borrow::Cow;

/// Renders an optional error context as ` (context)` for `thiserror` messages.
#[allow(clippy::ref_option)]
#[must_use]
pub fn format_context(context: &Option<Cow<'static, str>>) -> Cow<'static, str> {
    context.as_ref().map_or(Cow::Borrowed(""), |c| Cow::Owned(format!(" ({c})")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_present_and_absent_context() {
        assert_eq!(format_context(&None), "");
        assert_eq!(format_context(&Some("loading model".into())), " (loading model)");
    }
}

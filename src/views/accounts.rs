use axum::response::Html;

use super::{escape, form_fields, layout, non_field_errors, PageContext};
use crate::forms::{FormErrors, LoginForm, SignupForm, LOGIN_FIELDS, SIGNUP_FIELDS};

pub fn signup_page(
    ctx: &PageContext<'_>,
    form: &SignupForm,
    errors: &FormErrors,
    min_password_length: usize,
) -> Html<String> {
    let body = format!(
        r#"<form method="post" action="/accounts/signup/" class="signup-form">
{non_field}{fields}<p class="help">Your password must contain at least {min} characters, can't be entirely numeric and can't be too similar to your username.</p>
<p><button type="submit">Sign up</button></p>
</form>
<p>Already have an account? <a href="/accounts/login/">Log in</a></p>
"#,
        non_field = non_field_errors(errors),
        fields = form_fields(&SIGNUP_FIELDS, |name| form.value(name), errors),
        min = min_password_length,
    );
    layout(ctx, &body)
}

/// `next` is echoed as a hidden field so the post-login redirect survives
/// a failed attempt.
pub fn login_page(ctx: &PageContext<'_>, form: &LoginForm, errors: &FormErrors) -> Html<String> {
    let next = form
        .next
        .as_deref()
        .map(|next| format!(r#"<input type="hidden" name="next" value="{}">"#, escape(next)))
        .unwrap_or_default();
    let body = format!(
        r#"<form method="post" action="/accounts/login/" class="login-form">
{non_field}{fields}{next}
<p><button type="submit">Log in</button></p>
</form>
<p>No account yet? <a href="/accounts/signup/">Sign up</a></p>
"#,
        non_field = non_field_errors(errors),
        fields = form_fields(&LOGIN_FIELDS, |name| form.value(name), errors),
        next = next,
    );
    layout(ctx, &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signup_never_echoes_passwords() {
        let form = SignupForm {
            username: "jane".into(),
            password1: "s3cret-pass".into(),
            password2: "other-pass".into(),
        };
        let mut errors = FormErrors::default();
        errors.add("password2", "The two password fields didn't match.");
        let Html(html) = signup_page(&PageContext::new("Sign up", None, &[]), &form, &errors, 8);
        assert!(html.contains(r#"value="jane""#));
        assert!(!html.contains("s3cret-pass"));
        assert!(html.contains("The two password fields didn&#39;t match."));
    }

    #[test]
    fn login_keeps_next_target() {
        let form = LoginForm {
            username: "jane".into(),
            password: String::new(),
            next: Some("/?q=a&page=2".into()),
        };
        let Html(html) = login_page(&PageContext::new("Log in", None, &[]), &form, &FormErrors::default());
        assert!(html.contains(r#"<input type="hidden" name="next" value="/?q=a&amp;page=2">"#));
    }
}

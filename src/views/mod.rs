//! Server-rendered HTML pages.
//!
//! Every interpolated value goes through [`escape`]; page functions return
//! complete documents wrapped in [`layout`].

pub mod accounts;
pub mod contacts;

use axum::{http::StatusCode, response::Html};
use std::fmt::Write;

use crate::forms::{FieldSpec, FormErrors, InputKind};
use crate::middleware::{CurrentUser, FlashMessage};

const SITE_NAME: &str = "Contact Book";

/// What every page needs besides its body
pub struct PageContext<'a> {
    pub title: &'a str,
    pub user: Option<&'a CurrentUser>,
    pub messages: &'a [FlashMessage],
}

impl<'a> PageContext<'a> {
    pub fn new(title: &'a str, user: Option<&'a CurrentUser>, messages: &'a [FlashMessage]) -> Self {
        Self { title, user, messages }
    }
}

/// HTML-escape text for element content and quoted attribute values
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn layout(ctx: &PageContext<'_>, body: &str) -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title} | {site}</title>
</head>
<body>
<header>
<a href="/" class="brand">{site}</a>
{nav}
</header>
{messages}<main>
<h1>{title}</h1>
{body}
</main>
</body>
</html>
"#,
        title = escape(ctx.title),
        site = SITE_NAME,
        nav = nav(ctx.user),
        messages = messages(ctx.messages),
        body = body,
    ))
}

fn nav(user: Option<&CurrentUser>) -> String {
    match user {
        Some(user) => format!(
            r#"<nav>
<span class="user">Signed in as {}</span>
<a href="/">Contacts</a>
<a href="/create/">Add contact</a>
<form method="post" action="/accounts/logout/" class="inline"><button type="submit">Log out</button></form>
</nav>"#,
            escape(&user.username)
        ),
        None => r#"<nav>
<a href="/accounts/login/">Log in</a>
<a href="/accounts/signup/">Sign up</a>
</nav>"#
            .to_string(),
    }
}

fn messages(messages: &[FlashMessage]) -> String {
    if messages.is_empty() {
        return String::new();
    }
    let mut out = String::from("<ul class=\"messages\">\n");
    for message in messages {
        let _ = writeln!(
            out,
            r#"<li class="{}">{}</li>"#,
            message.level.as_str(),
            escape(&message.text)
        );
    }
    out.push_str("</ul>\n");
    out
}

/// Render labelled inputs for `specs`, each followed by its errors.
/// Password inputs are never pre-filled.
pub fn form_fields<'v>(
    specs: &[FieldSpec],
    value: impl Fn(&str) -> &'v str,
    errors: &FormErrors,
) -> String {
    let mut out = String::new();
    for spec in specs {
        let id = format!("id_{}", spec.name);
        let required = if spec.required { " required" } else { "" };
        let maxlength = spec
            .max_length
            .map(|n| format!(r#" maxlength="{}""#, n))
            .unwrap_or_default();

        let _ = writeln!(out, r#"<p class="field">"#);
        let _ = writeln!(out, r#"<label for="{}">{}</label>"#, id, escape(spec.label));
        match spec.kind {
            InputKind::TextArea => {
                let _ = writeln!(
                    out,
                    r#"<textarea id="{id}" name="{name}" rows="3"{maxlength}{required}>{value}</textarea>"#,
                    id = id,
                    name = spec.name,
                    maxlength = maxlength,
                    required = required,
                    value = escape(value(spec.name)),
                );
            }
            InputKind::Password => {
                let _ = writeln!(
                    out,
                    r#"<input type="password" id="{}" name="{}"{}>"#,
                    id, spec.name, required
                );
            }
            kind => {
                let _ = writeln!(
                    out,
                    r#"<input type="{ty}" id="{id}" name="{name}" value="{value}"{maxlength}{required}>"#,
                    ty = kind.html_type(),
                    id = id,
                    name = spec.name,
                    value = escape(value(spec.name)),
                    maxlength = maxlength,
                    required = required,
                );
            }
        }
        out.push_str(&error_list(errors.field(spec.name)));
        out.push_str("</p>\n");
    }
    out
}

pub fn non_field_errors(errors: &FormErrors) -> String {
    error_list(errors.non_field())
}

fn error_list(errors: &[String]) -> String {
    if errors.is_empty() {
        return String::new();
    }
    let mut out = String::from("<ul class=\"errorlist\">\n");
    for error in errors {
        let _ = writeln!(out, "<li>{}</li>", escape(error));
    }
    out.push_str("</ul>\n");
    out
}

/// Standalone page for error responses
pub fn error_page(status: StatusCode, message: &str) -> Html<String> {
    let title = status.canonical_reason().unwrap_or("Error");
    let body = format!(
        "<p class=\"error\">{}</p>\n<p><a href=\"/\">Back to contacts</a></p>",
        escape(message)
    );
    layout(&PageContext::new(title, None, &[]), &body)
}

use axum::response::Html;
use std::fmt::Write;
use url::form_urlencoded;

use super::{escape, form_fields, layout, non_field_errors, PageContext};
use crate::database::models::Contact;
use crate::forms::{ContactForm, FormErrors, CONTACT_FIELDS};
use crate::pagination::{Page, PageWindow};

/// The owner's contact list: search box, one page of rows, page navigation.
pub fn list_page(ctx: &PageContext<'_>, page: &Page<Contact>, query: &str) -> Html<String> {
    let mut body = format!(
        r#"<form method="get" action="/" class="search">
<input type="search" name="q" value="{}" placeholder="Search by name, phone, email or address" aria-label="Search">
<button type="submit">Search</button>
</form>
<p><a href="/create/" class="button">Add contact</a></p>
"#,
        escape(query)
    );

    if page.items.is_empty() {
        if query.is_empty() {
            body.push_str("<p class=\"empty\">You have no contacts yet.</p>\n");
        } else {
            body.push_str("<p class=\"empty\">No contacts match your search.</p>\n");
        }
    } else {
        body.push_str(
            "<table class=\"contacts\">\n<thead><tr><th>Name</th><th>Phone</th><th>Email</th><th>Address</th><th></th></tr></thead>\n<tbody>\n",
        );
        for contact in &page.items {
            let _ = writeln!(
                body,
                r#"<tr data-contact-id="{id}"><td class="name">{name}</td><td class="phone">{phone}</td><td class="email">{email}</td><td class="address">{address}</td><td class="actions"><a href="/update/{id}/">Edit</a> <a href="/delete/{id}/">Delete</a></td></tr>"#,
                id = contact.id,
                name = escape(&contact.name),
                phone = escape(&contact.phone),
                email = escape(&contact.email),
                address = escape(&contact.address),
            );
        }
        body.push_str("</tbody>\n</table>\n");
    }

    body.push_str(&pagination(&page.window, query));
    layout(ctx, &body)
}

fn pagination(window: &PageWindow, query: &str) -> String {
    let mut out = String::from("<nav class=\"pagination\">\n");
    if window.has_previous() {
        let _ = writeln!(out, r#"<a href="{}">First</a>"#, page_href(1, query));
        let _ = writeln!(out, r#"<a href="{}" rel="prev">Previous</a>"#, page_href(window.number - 1, query));
    }
    let _ = writeln!(
        out,
        r#"<span class="current">Page {} of {}</span>"#,
        window.number, window.num_pages
    );
    if window.has_next() {
        let _ = writeln!(out, r#"<a href="{}" rel="next">Next</a>"#, page_href(window.number + 1, query));
        let _ = writeln!(out, r#"<a href="{}">Last</a>"#, page_href(window.num_pages, query));
    }
    out.push_str("</nav>\n");
    out
}

/// Link to another page of the same result set; the search term is kept.
fn page_href(number: i64, query: &str) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    serializer.append_pair("page", &number.to_string());
    if !query.is_empty() {
        serializer.append_pair("q", query);
    }
    escape(&format!("/?{}", serializer.finish()))
}

/// Create and update share one form page; only heading and target differ.
pub fn form_page(
    ctx: &PageContext<'_>,
    action: &str,
    submit_label: &str,
    form: &ContactForm,
    errors: &FormErrors,
) -> Html<String> {
    let body = format!(
        r#"<form method="post" action="{action}" class="contact-form">
{non_field}{fields}<p><button type="submit">{submit}</button> <a href="/">Cancel</a></p>
</form>
"#,
        action = escape(action),
        non_field = non_field_errors(errors),
        fields = form_fields(&CONTACT_FIELDS, |name| form.value(name), errors),
        submit = escape(submit_label),
    );
    layout(ctx, &body)
}

pub fn confirm_delete_page(ctx: &PageContext<'_>, contact: &Contact) -> Html<String> {
    let body = format!(
        r#"<p>Are you sure you want to delete &quot;{name}&quot;?</p>
<form method="post" action="/delete/{id}/">
<button type="submit">Yes, delete</button> <a href="/">Cancel</a>
</form>
"#,
        name = escape(&contact.name),
        id = contact.id,
    );
    layout(ctx, &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::Paginator;
    use chrono::Utc;

    fn contact(id: i64, name: &str) -> Contact {
        Contact {
            id,
            user_id: 1,
            name: name.to_string(),
            phone: "555-1000".to_string(),
            email: String::new(),
            address: String::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn list_links_keep_search_term() {
        let window = Paginator::new(12, 5).page(Some("2"));
        let page = Page::new(vec![contact(6, "Ann & Bob")], window);
        let Html(html) = list_page(&PageContext::new("Contacts", None, &[]), &page, "ann b");

        assert!(html.contains("Ann &amp; Bob"));
        assert!(html.contains(r#"value="ann b""#));
        assert!(html.contains("Page 2 of 3"));
        assert!(html.contains(r#"href="/?page=3&amp;q=ann+b""#));
        assert!(html.contains(r#"href="/?page=1&amp;q=ann+b""#));
        assert!(html.contains(r#"href="/update/6/""#));
    }

    #[test]
    fn empty_list_has_no_navigation_links() {
        let page: Page<Contact> = Page::empty(5);
        let Html(html) = list_page(&PageContext::new("Contacts", None, &[]), &page, "");
        assert!(html.contains("You have no contacts yet."));
        assert!(html.contains("Page 1 of 1"));
        assert!(!html.contains("rel=\"next\""));
    }
}

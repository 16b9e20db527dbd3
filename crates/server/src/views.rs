//! Server-rendered markup for the page shell and its detail routes.

use axum::http::StatusCode;
use shared::{
    domain::{Contact, ContactId},
    protocol::{contact_route, destroy_contact_route, edit_contact_route, RootData},
    search::SearchSync,
};

const APP_TITLE: &str = "Contacts";

/// Everything the layout needs besides the detail markup.
pub(crate) struct Shell<'a> {
    pub(crate) data: &'a RootData,
    pub(crate) search: &'a SearchSync,
    pub(crate) active: Option<&'a ContactId>,
}

impl<'a> Shell<'a> {
    pub(crate) fn new(data: &'a RootData, search: &'a SearchSync) -> Self {
        Self {
            data,
            search,
            active: None,
        }
    }

    pub(crate) fn with_active(mut self, id: &'a ContactId) -> Self {
        self.active = Some(id);
        self
    }
}

pub(crate) fn render_document(shell: &Shell<'_>, detail: &str) -> String {
    let search = shell.search;
    let spinner_hidden = if search.is_searching() { "" } else { " hidden" };
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
</head>
<body>
<div id="sidebar">
<h1>{title}</h1>
<div>
<form id="search-form" role="search" method="get" action="/">
<input id="q" class="{input_class}" value="{search_text}" aria-label="Search contacts" placeholder="Search" type="search" name="q">
<div id="search-spinner" aria-hidden="true"{spinner_hidden}></div>
</form>
<form method="post" action="/">
<button type="submit">New</button>
</form>
</div>
<nav>
{sidebar}
</nav>
</div>
<div id="detail" class="{detail_class}">
{detail}
</div>
</body>
</html>
"#,
        title = APP_TITLE,
        input_class = search.input_class(),
        search_text = escape_html(search.text()),
        sidebar = render_sidebar(&shell.data.contacts, shell.active),
        detail_class = search.detail_class(),
    )
}

fn render_sidebar(contacts: &[Contact], active: Option<&ContactId>) -> String {
    if contacts.is_empty() {
        return "<p><i>No contacts</i></p>".to_string();
    }

    let items: Vec<String> = contacts
        .iter()
        .map(|contact| {
            let class = if active == Some(&contact.id) {
                "active"
            } else {
                ""
            };
            let star = if contact.favorite {
                " <span>★</span>"
            } else {
                ""
            };
            format!(
                r#"<li><a class="{class}" href="{href}">{name}{star}</a></li>"#,
                href = escape_html(&contact_route(&contact.id)),
                name = render_name(contact),
            )
        })
        .collect();
    format!("<ul>\n{}\n</ul>", items.join("\n"))
}

fn render_name(contact: &Contact) -> String {
    match contact.display_name() {
        Some(name) => escape_html(&name),
        None => "<i>No Name</i>".to_string(),
    }
}

pub(crate) fn render_index() -> String {
    r#"<p id="index-page">Pick a contact from the sidebar, search for one, or press <b>New</b> to add someone.</p>"#
        .to_string()
}

pub(crate) fn render_contact(contact: &Contact) -> String {
    let avatar = contact
        .avatar
        .as_deref()
        .map(|src| {
            format!(
                r#"<div><img alt="{alt}" src="{src}"></div>"#,
                alt = escape_html(&contact.display_name().unwrap_or_default()),
                src = escape_html(src)
            )
        })
        .unwrap_or_default();
    let twitter = contact
        .twitter
        .as_deref()
        .map(|handle| {
            let handle = escape_html(handle);
            format!(
                r#"<p><a href="https://twitter.com/{}">{handle}</a></p>"#,
                handle.trim_start_matches('@')
            )
        })
        .unwrap_or_default();
    let notes = contact
        .notes
        .as_deref()
        .map(|notes| format!("<p>{}</p>", escape_html(notes)))
        .unwrap_or_default();
    let (favorite_value, favorite_label, favorite_glyph) = if contact.favorite {
        ("false", "Remove from favorites", "★")
    } else {
        ("true", "Add to favorites", "☆")
    };

    format!(
        r#"<div id="contact">
{avatar}
<div>
<h1>{name}
<form method="post" action="{self_href}">
<button aria-label="{favorite_label}" name="favorite" value="{favorite_value}">{favorite_glyph}</button>
</form>
</h1>
{twitter}
{notes}
<div>
<form action="{edit_href}">
<button type="submit">Edit</button>
</form>
<form method="post" action="{destroy_href}" onsubmit="return confirm('Please confirm you want to delete this record.');">
<button type="submit">Delete</button>
</form>
</div>
</div>
</div>"#,
        name = render_name(contact),
        self_href = escape_html(&contact_route(&contact.id)),
        edit_href = escape_html(&edit_contact_route(&contact.id)),
        destroy_href = escape_html(&destroy_contact_route(&contact.id)),
    )
}

pub(crate) fn render_edit(contact: &Contact) -> String {
    let field = |value: &Option<String>| escape_html(value.as_deref().unwrap_or_default());
    format!(
        r#"<form id="contact-form" method="post" action="{action}">
<p>
<span>Name</span>
<input aria-label="First name" name="first" type="text" placeholder="First" value="{first}">
<input aria-label="Last name" name="last" type="text" placeholder="Last" value="{last}">
</p>
<label><span>Twitter</span><input name="twitter" type="text" placeholder="@jack" value="{twitter}"></label>
<label><span>Avatar URL</span><input aria-label="Avatar URL" name="avatar" type="text" placeholder="https://example.com/avatar.jpg" value="{avatar}"></label>
<label><span>Notes</span><textarea name="notes" rows="6">{notes}</textarea></label>
<p>
<button type="submit">Save</button>
<button type="button" onclick="history.back()">Cancel</button>
</p>
</form>"#,
        action = escape_html(&edit_contact_route(&contact.id)),
        first = field(&contact.first),
        last = field(&contact.last),
        twitter = field(&contact.twitter),
        avatar = field(&contact.avatar),
        notes = field(&contact.notes),
    )
}

pub(crate) fn render_error_page(status: StatusCode, message: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
</head>
<body>
<div id="error-page">
<h1>{code} {reason}</h1>
<p><i>{message}</i></p>
<p><a href="/">Back to contacts</a></p>
</div>
</body>
</html>
"#,
        title = APP_TITLE,
        code = status.as_u16(),
        reason = status.canonical_reason().unwrap_or("Error"),
        message = escape_html(message),
    )
}

pub(crate) fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

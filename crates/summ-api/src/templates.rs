//! Server-rendered HTML. Every piece of user data goes through `escape` or
//! `attr`.

use std::fmt::Write;

use axum::http::StatusCode;

use summ_db::models::{CategoryRow, SummaryRow};
use summ_llm::web_url;
use summ_types::api::{ListQuery, SessionUser, UpdateSummaryForm};

/// Per-request rendering context: who is logged in and what to tell them.
pub struct Page<'a> {
    pub user: Option<&'a SessionUser>,
    pub messages: Vec<String>,
}

impl<'a> Page<'a> {
    pub fn new(user: Option<&'a SessionUser>, messages: Vec<String>) -> Self {
        Self { user, messages }
    }

    pub fn with_message(user: Option<&'a SessionUser>, message: String) -> Self {
        Self::new(user, vec![message])
    }
}

/// Escapes `text` for element content.
pub fn escape(text: &str) -> String {
    html_escape::encode_text(text).into_owned()
}

/// Escapes `text` for a double-quoted attribute value.
pub fn attr(text: &str) -> String {
    html_escape::encode_double_quoted_attribute(text).into_owned()
}

/// `href` value for a stored video link; anything but http(s) becomes `#`.
fn link(url: &str) -> String {
    if web_url(url).is_some() {
        attr(url)
    } else {
        "#".to_string()
    }
}

fn layout(page: &Page<'_>, title: &str, body: &str) -> String {
    let nav = match page.user {
        Some(user) => format!(
            r#"<span>{}</span>
      <a href="/favorites">Favorites</a>
      <a href="/auth/logout">Log Out</a>"#,
            escape(&user.username)
        ),
        None => r#"<a href="/auth/register">Register</a>
      <a href="/auth/login">Log In</a>"#
            .to_string(),
    };

    let mut flashes = String::new();
    for message in &page.messages {
        let _ = write!(flashes, r#"<div class="flash">{}</div>"#, escape(message));
    }

    format!(
        r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>{title} - Summ</title>
</head>
<body>
  <nav>
    <h1><a href="/">Summ</a></h1>
    <div class="user">
      {nav}
    </div>
  </nav>
  <main>
    {flashes}
    {body}
  </main>
</body>
</html>
"#,
        title = escape(title),
    )
}

fn display_title(summary: &SummaryRow) -> String {
    escape(summary.yt_title.as_deref().unwrap_or("(untitled)"))
}

fn category_options(categories: &[CategoryRow], selected: &str) -> String {
    let mut options = String::new();
    for category in categories {
        let id = category.id.to_string();
        let marker = if id == selected { " selected" } else { "" };
        let _ = write!(
            options,
            r#"<option value="{id}"{marker}>{}</option>"#,
            escape(&category.category_name)
        );
    }
    options
}

/// Shared table for the listing and the favorites page. `favorites` is
/// `Some` when a user is logged in.
fn summary_table(page: &Page<'_>, summaries: &[SummaryRow], favorites: Option<&[i64]>) -> String {
    if summaries.is_empty() {
        return "<p>No summaries yet.</p>".to_string();
    }

    let mut rows = String::new();
    for summary in summaries {
        let mut actions = String::new();
        if let Some(favorites) = favorites {
            if favorites.contains(&summary.id) {
                let _ = write!(
                    actions,
                    r#"<form method="post" action="/unfavorite/{}"><button type="submit">Unfavorite</button></form>"#,
                    summary.id
                );
            } else {
                let _ = write!(
                    actions,
                    r#"<form method="post" action="/favorite/{}"><button type="submit">Favorite</button></form>"#,
                    summary.id
                );
            }
        }
        if page.user.is_some_and(|u| u.id == summary.author_id) {
            let _ = write!(actions, r#"<a href="/update/{}">Edit</a>"#, summary.id);
        }

        let _ = write!(
            rows,
            r#"
      <tr>
        <td><a href="/detail/{id}">{title}</a> <a href="{url}">Watch</a></td>
        <td>{channel}</td>
        <td>{category}</td>
        <td>{summary_text}</td>
        <td>{date}</td>
        <td>{author}</td>
        <td>{actions}</td>
      </tr>"#,
            id = summary.id,
            title = display_title(summary),
            url = link(&summary.yt_url),
            channel = escape(summary.yt_channel_name.as_deref().unwrap_or("")),
            category = escape(&summary.category_name),
            summary_text = escape(&summary.summary_text),
            date = summary.created_at.format("%Y-%m-%d"),
            author = escape(&summary.author_username),
        );
    }

    format!(
        r#"<table>
      <thead>
        <tr>
          <th>YouTube Title</th>
          <th>Channel</th>
          <th>Category</th>
          <th>Summary</th>
          <th>Date</th>
          <th>Created by</th>
          <th></th>
        </tr>
      </thead>
      <tbody>{rows}
      </tbody>
    </table>"#
    )
}

pub fn index_page(
    page: &Page<'_>,
    summaries: &[SummaryRow],
    categories: &[CategoryRow],
    query: &ListQuery,
    favorites: &[i64],
) -> String {
    let mut options = String::from(r#"<option value="">All categories</option>"#);
    for category in categories {
        let marker = if category.category_name == query.category {
            " selected"
        } else {
            ""
        };
        let name = attr(&category.category_name);
        let _ = write!(options, r#"<option value="{name}"{marker}>{name}</option>"#);
    }

    let create_link = if page.user.is_some() {
        r#"<a class="action" href="/create">New</a>"#
    } else {
        ""
    };

    let table = summary_table(page, summaries, page.user.map(|_| favorites));

    let body = format!(
        r#"<header>
      <h2>Summaries</h2>
      {create_link}
    </header>
    <form method="get" action="/">
      <select name="category">{options}</select>
      <input name="search" placeholder="Search titles" value="{search}">
      <button type="submit">Filter</button>
    </form>
    {table}"#,
        search = attr(&query.search),
    );
    layout(page, "Summaries", &body)
}

pub fn favorites_page(page: &Page<'_>, summaries: &[SummaryRow]) -> String {
    let ids: Vec<i64> = summaries.iter().map(|s| s.id).collect();
    let table = summary_table(page, summaries, Some(&ids));
    let body = format!(
        r#"<header>
      <h2>Favorites</h2>
    </header>
    {table}"#
    );
    layout(page, "Favorites", &body)
}

pub fn create_page(
    page: &Page<'_>,
    categories: &[CategoryRow],
    yt_url: &str,
    selected_category: &str,
) -> String {
    let body = format!(
        r#"<header>
      <h2>New Summary</h2>
    </header>
    <form method="post" action="/create">
      <label for="yt_url">YouTube URL</label>
      <input name="yt_url" id="yt_url" value="{url}" required>
      <label for="category_name">Category</label>
      <select name="category_name" id="category_name">
        <option value="">Choose a category</option>
        {options}
      </select>
      <button type="submit">Summarize</button>
    </form>"#,
        url = attr(yt_url),
        options = category_options(categories, selected_category),
    );
    layout(page, "New Summary", &body)
}

pub fn detail_page(page: &Page<'_>, summary: &SummaryRow) -> String {
    let edit = if page.user.is_some_and(|u| u.id == summary.author_id) {
        format!(r#"<a class="action" href="/update/{}">Edit</a>"#, summary.id)
    } else {
        String::new()
    };

    let body = format!(
        r#"<header>
      <h2>Summary Details</h2>
      {edit}
    </header>
    <article>
      <h3>{title}</h3>
      <p><a href="{href}">{url}</a></p>
      <dl>
        <dt>Channel</dt><dd>{channel}</dd>
        <dt>Category</dt><dd>{category}</dd>
        <dt>Created by</dt><dd>{author}</dd>
        <dt>Date</dt><dd>{date}</dd>
      </dl>
      <section>
        <h4>Summary</h4>
        <p>{summary_text}</p>
      </section>
      <details>
        <summary>Transcript</summary>
        <p>{transcript}</p>
      </details>
    </article>"#,
        title = display_title(summary),
        href = link(&summary.yt_url),
        url = escape(&summary.yt_url),
        channel = escape(summary.yt_channel_name.as_deref().unwrap_or("")),
        category = escape(&summary.category_name),
        author = escape(&summary.author_username),
        date = summary.created_at.format("%Y-%m-%d %H:%M"),
        summary_text = escape(&summary.summary_text),
        transcript = escape(&summary.transcript),
    );
    layout(page, "Summary Details", &body)
}

pub fn update_page(
    page: &Page<'_>,
    summary_id: i64,
    values: &UpdateSummaryForm,
    categories: &[CategoryRow],
) -> String {
    let body = format!(
        r#"<header>
      <h2>Edit "{title}"</h2>
    </header>
    <form method="post" action="/update/{id}">
      <label for="yt_title">YouTube Title</label>
      <input name="yt_title" id="yt_title" value="{title}">
      <label for="yt_channel_name">Channel</label>
      <input name="yt_channel_name" id="yt_channel_name" value="{channel}">
      <label for="category_name">Category</label>
      <select name="category_name" id="category_name">{options}</select>
      <label for="summary_text">Summary</label>
      <textarea name="summary_text" id="summary_text">{summary_text}</textarea>
      <button type="submit">Save</button>
    </form>
    <hr>
    <form method="post" action="/delete/{id}">
      <button type="submit" onclick="return confirm('Are you sure?');">Delete</button>
    </form>"#,
        id = summary_id,
        title = attr(&values.yt_title),
        channel = attr(&values.yt_channel_name),
        options = category_options(categories, &values.category_name),
        summary_text = escape(&values.summary_text),
    );
    layout(page, "Edit Summary", &body)
}

pub fn login_page(page: &Page<'_>, username: &str) -> String {
    auth_form(page, "Log In", "/auth/login", username)
}

pub fn register_page(page: &Page<'_>, username: &str) -> String {
    auth_form(page, "Register", "/auth/register", username)
}

fn auth_form(page: &Page<'_>, title: &str, action: &str, username: &str) -> String {
    let body = format!(
        r#"<header>
      <h2>{title}</h2>
    </header>
    <form method="post" action="{action}">
      <label for="username">Username</label>
      <input name="username" id="username" value="{username}" required>
      <label for="password">Password</label>
      <input type="password" name="password" id="password" required>
      <button type="submit">{title}</button>
    </form>"#,
        username = attr(username),
    );
    layout(page, title, &body)
}

pub fn error_page(status: StatusCode, message: &str) -> String {
    let title = format!(
        "{} {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Error")
    );
    let body = format!(
        r#"<header>
      <h2>{}</h2>
    </header>
    <p>{}</p>"#,
        escape(&title),
        escape(message)
    );
    layout(&Page::new(None, Vec::new()), &title, &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn summary(id: i64, author_id: i64) -> SummaryRow {
        SummaryRow {
            id,
            yt_url: "https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=1".into(),
            yt_title: Some("<script>alert(1)</script>".into()),
            yt_channel_name: None,
            transcript: "t".into(),
            summary_text: "s".into(),
            author_id,
            author_username: "test".into(),
            category_id: 1,
            category_name: "Music".into(),
            created_at: NaiveDateTime::default(),
        }
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(escape("<b>&</b>"), "&lt;b&gt;&amp;&lt;/b&gt;");
        let quoted = attr(r#"x" onmouseover="alert(1)"#);
        assert!(!quoted.contains('"'));
        assert!(quoted.starts_with("x&"));
    }

    #[test]
    fn non_web_links_are_neutralised() {
        let mut row = summary(1, 1);
        row.yt_url = "javascript:alert(1)//?v=dQw4w9WgXcQ".into();
        let page = Page::new(None, Vec::new());

        let html = index_page(&page, &[row.clone()], &[], &ListQuery::default(), &[]);
        assert!(!html.contains(r#"href="javascript:"#));
        assert!(html.contains(r##"<a href="#">Watch</a>"##));

        let html = detail_page(&page, &row);
        assert!(!html.contains(r#"href="javascript:"#));
    }

    #[test]
    fn anonymous_index_offers_login() {
        let page = Page::new(None, Vec::new());
        let html = index_page(&page, &[summary(1, 1)], &[], &ListQuery::default(), &[]);
        assert!(html.contains("Log In"));
        assert!(html.contains("Register"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
        assert!(html.contains(r#"href="https://www.youtube.com/watch?v=dQw4w9WgXcQ&amp;t=1""#));
        assert!(!html.contains("/favorite/1"));
        assert!(!html.contains("/update/1"));
    }

    #[test]
    fn author_sees_edit_and_favorite_controls() {
        let user = SessionUser {
            id: 1,
            username: "test".into(),
        };
        let page = Page::new(Some(&user), vec!["hello".into()]);
        let html = index_page(
            &page,
            &[summary(1, 1), summary(2, 2)],
            &[],
            &ListQuery::default(),
            &[2],
        );
        assert!(html.contains("Log Out"));
        assert!(html.contains(r#"action="/favorite/1""#));
        assert!(html.contains(r#"action="/unfavorite/2""#));
        assert!(html.contains(r#"href="/update/1""#));
        assert!(!html.contains(r#"href="/update/2""#));
        assert!(html.contains(r#"<div class="flash">hello</div>"#));
    }

    #[test]
    fn error_page_names_status() {
        let html = error_page(StatusCode::NOT_FOUND, "Summary id 5 doesn't exist.");
        assert!(html.contains("404 Not Found"));
        assert!(html.contains("Summary id 5 doesn't exist."));
    }
}

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use axum_extra::extract::cookie::SignedCookieJar;
use tracing::error;

use crate::{
    api::{ApiError, Folder, HandleDetails, LinkItem},
    token,
    web::{
        AppState, session,
        templates::{self, escape_html},
    },
};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Tab {
    Profile,
    Links,
    Folders,
}

/// `GET /:username` — the public profile page.
pub async fn profile_page(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Path(username): Path<String>,
) -> Response {
    let (details, is_owner) = match load_profile(&state, &jar, &username).await {
        Ok(Some(loaded)) => loaded,
        Ok(None) => return not_found(&username),
        Err(err) => return upstream_failure(err),
    };

    let content = render_overview_section(&details, is_owner);
    page_response(&username, &details, is_owner, Tab::Profile, &content)
}

/// `GET /:username/links` — the profile's link grid.
pub async fn links_page(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Path(username): Path<String>,
) -> Response {
    let (details, is_owner) = match load_profile(&state, &jar, &username).await {
        Ok(Some(loaded)) => loaded,
        Ok(None) => return not_found(&username),
        Err(err) => return upstream_failure(err),
    };

    let links = match &details.id {
        Some(id) => state.api().links_for_user(id).await.unwrap_or_else(|err| {
            error!(%err, "failed to fetch links");
            Vec::new()
        }),
        None => Vec::new(),
    };

    let content = render_links_section(&links, is_owner);
    page_response(&username, &details, is_owner, Tab::Links, &content)
}

/// `GET /:username/folders` — the profile's folder grid.
pub async fn folders_page(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Path(username): Path<String>,
) -> Response {
    let (details, is_owner) = match load_profile(&state, &jar, &username).await {
        Ok(Some(loaded)) => loaded,
        Ok(None) => return not_found(&username),
        Err(err) => return upstream_failure(err),
    };

    let folders = match &details.id {
        Some(id) => state
            .api()
            .folders_for_user(id)
            .await
            .unwrap_or_else(|err| {
                error!(%err, "failed to fetch folders");
                Vec::new()
            }),
        None => Vec::new(),
    };

    let content = render_folders_section(&folders, is_owner);
    page_response(&username, &details, is_owner, Tab::Folders, &content)
}

/// Fetch the handle's details and decide ownership: the viewer owns the page
/// when their session token decodes to the same handle and the same name the
/// API reports. A usability check only; mutations are still authorized
/// upstream against the bearer token.
async fn load_profile(
    state: &AppState,
    jar: &SignedCookieJar,
    username: &str,
) -> Result<Option<(HandleDetails, bool)>, ApiError> {
    let Some(details) = state.api().handle_details(username).await? else {
        return Ok(None);
    };

    let is_owner = session::access_token(jar)
        .and_then(|token_str| token::decode(&token_str).ok())
        .map(|claims| {
            claims.handle.as_deref() == Some(username)
                && claims.name.as_deref() == Some(details.name.as_str())
        })
        .unwrap_or(false);

    Ok(Some((details, is_owner)))
}

fn not_found(username: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Html(templates::render_not_found_page(username)),
    )
        .into_response()
}

fn upstream_failure(err: ApiError) -> Response {
    error!(%err, "failed to load profile");
    (
        err.status(),
        Html(templates::render_error_page(
            "The profile service is unavailable right now.",
        )),
    )
        .into_response()
}

fn page_response(
    username: &str,
    details: &HandleDetails,
    is_owner: bool,
    tab: Tab,
    content_html: &str,
) -> Response {
    let title = if details.name.is_empty() {
        username.to_string()
    } else {
        details.name.clone()
    };
    let body = render_profile_shell(username, details, is_owner, tab, content_html);

    Html(templates::render_page(
        &title,
        &details.bio,
        &body,
        templates::avatar_script(),
    ))
    .into_response()
}

fn render_profile_shell(
    username: &str,
    details: &HandleDetails,
    is_owner: bool,
    tab: Tab,
    content_html: &str,
) -> String {
    let handle = escape_html(username);
    let name = escape_html(&details.name);

    let avatar_html = if details.avatar.is_empty() {
        let initial = details
            .name
            .chars()
            .next()
            .or_else(|| username.chars().next())
            .unwrap_or('?');
        format!(
            r#"<div class="placeholder">{}</div>"#,
            escape_html(&initial.to_string())
        )
    } else {
        format!(
            r#"<img src="{src}" alt="">"#,
            src = escape_html(&details.avatar)
        )
    };

    let avatar_controls = if is_owner {
        let delete_form = if details.avatar.is_empty() {
            String::new()
        } else {
            format!(
                r#"<form method="post" action="/{handle}" enctype="multipart/form-data">
                    <input type="hidden" name="__action" value="delete-avatar">
                    <button type="submit">Remove photo</button>
                </form>"#
            )
        };
        format!(
            r#"<div class="avatar-controls">
                <form method="post" action="/{handle}" enctype="multipart/form-data">
                    <input type="hidden" name="__action" value="add-avatar">
                    <label class="avatar-upload">Change photo
                        <input type="file" id="avatar-input" name="avatar" accept="image/*" hidden>
                    </label>
                </form>
                {delete_form}
            </div>"#
        )
    } else {
        String::new()
    };

    let badge = if is_owner { "Me" } else { "Guest" };
    let bio_html = if !details.bio.is_empty() {
        format!("<p>{}</p>", escape_html(&details.bio))
    } else if is_owner {
        "<p>Add your bio!</p>".to_string()
    } else {
        String::new()
    };

    let logout_html = if is_owner {
        r#"<form method="post" action="/logout"><button type="submit">Log out</button></form>"#
    } else {
        ""
    };

    let tab_class = |this: Tab| if tab == this { " class=\"active\"" } else { "" };
    let profile_active = tab_class(Tab::Profile);
    let links_active = tab_class(Tab::Links);
    let folders_active = tab_class(Tab::Folders);

    format!(
        r#"    <main class="profile">
        <div class="profile-grid">
            <div class="identity">
                <div class="avatar-frame">{avatar_html}</div>
                {avatar_controls}
                <div class="identity-text">
                    <span class="badge">{badge}</span>
                    <h1>{name}</h1>
                    <div class="bio">{bio_html}</div>
                </div>
            </div>
            <div class="content">
{content_html}
            </div>
        </div>
        <nav class="dock">
            <a href="/{handle}"{profile_active}>Profile</a>
            <a href="/{handle}/links"{links_active}>Links</a>
            <a href="/{handle}/folders"{folders_active}>Folders</a>
            {logout_html}
        </nav>
    </main>"#
    )
}

fn render_overview_section(details: &HandleDetails, is_owner: bool) -> String {
    let message = if is_owner {
        "Pick Links or Folders from the dock below to manage your collection.".to_string()
    } else {
        let who = if details.name.is_empty() {
            "this user".to_string()
        } else {
            escape_html(&details.name)
        };
        format!("Browse {who}'s links and folders from the dock below.")
    };

    format!(r#"<div class="empty-state"><p>{message}</p></div>"#)
}

fn render_links_section(links: &[LinkItem], is_owner: bool) -> String {
    if links.is_empty() {
        let who = if is_owner { "You have" } else { "This user has" };
        return format!(
            r#"<div class="empty-state"><p>{who} not added any links yet.</p></div>"#
        );
    }

    let cards = links
        .iter()
        .map(|link| {
            format!(
                r#"<a class="card" href="{url}" target="_blank" rel="noreferrer">
                    <div class="glyph">&#128279;</div>
                    <div>
                        <div class="label">{label}</div>
                        <div class="sub">{url}</div>
                    </div>
                </a>"#,
                url = escape_html(&link.url),
                label = escape_html(&link.label),
            )
        })
        .collect::<String>();

    format!(r#"<div class="card-grid">{cards}</div>"#)
}

fn render_folders_section(folders: &[Folder], is_owner: bool) -> String {
    if folders.is_empty() {
        let who = if is_owner { "You have" } else { "This user has" };
        return format!(
            r#"<div class="empty-state"><p>{who} not added any folders yet.</p></div>"#
        );
    }

    let cards = folders
        .iter()
        .map(|folder| {
            format!(
                r#"<div class="card">
                    <div class="glyph">&#128193;</div>
                    <div class="label">{name}</div>
                </div>"#,
                name = escape_html(&folder.name),
            )
        })
        .collect::<String>();

    format!(r#"<div class="card-grid">{cards}</div>"#)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details(name: &str, bio: &str, avatar: &str) -> HandleDetails {
        HandleDetails {
            id: Some("65a4f008f5599db423841902".into()),
            name: name.into(),
            bio: bio.into(),
            avatar: avatar.into(),
        }
    }

    #[test]
    fn owner_sees_avatar_controls_and_logout() {
        let html = render_profile_shell(
            "alice",
            &details("Alice", "hello", "https://cdn.example/a.png"),
            true,
            Tab::Profile,
            "",
        );

        assert!(html.contains(r#"value="add-avatar""#));
        assert!(html.contains(r#"value="delete-avatar""#));
        assert!(html.contains(r#"action="/logout""#));
        assert!(html.contains(">Me</span>"));
    }

    #[test]
    fn guest_sees_no_controls() {
        let html = render_profile_shell(
            "alice",
            &details("Alice", "hello", ""),
            false,
            Tab::Links,
            "",
        );

        assert!(!html.contains("add-avatar"));
        assert!(!html.contains("/logout"));
        assert!(html.contains(">Guest</span>"));
    }

    #[test]
    fn delete_control_only_appears_with_an_avatar() {
        let html = render_profile_shell("alice", &details("Alice", "", ""), true, Tab::Profile, "");

        assert!(html.contains("add-avatar"));
        assert!(!html.contains("delete-avatar"));
    }

    #[test]
    fn owner_without_bio_is_prompted() {
        let html = render_profile_shell("alice", &details("Alice", "", ""), true, Tab::Profile, "");
        assert!(html.contains("Add your bio!"));
    }

    #[test]
    fn profile_values_are_html_escaped() {
        let html = render_profile_shell(
            "alice",
            &details("<Alice>", "a & b", ""),
            false,
            Tab::Profile,
            "",
        );

        assert!(html.contains("&lt;Alice&gt;"));
        assert!(html.contains("a &amp; b"));
    }

    #[test]
    fn links_section_renders_cards_or_empty_state() {
        let links = vec![LinkItem {
            id: "1".into(),
            label: "Blog".into(),
            url: "https://example.com".into(),
        }];

        let html = render_links_section(&links, false);
        assert!(html.contains("https://example.com"));
        assert!(html.contains("Blog"));

        let empty = render_links_section(&[], true);
        assert!(empty.contains("You have not added any links yet."));
        let empty_guest = render_links_section(&[], false);
        assert!(empty_guest.contains("This user has not added any links yet."));
    }

    #[test]
    fn active_tab_is_marked_in_the_dock() {
        let html = render_profile_shell(
            "alice",
            &details("Alice", "", ""),
            false,
            Tab::Folders,
            "",
        );

        assert!(html.contains(r#"<a href="/alice/folders" class="active">"#));
        assert!(html.contains(r#"<a href="/alice/links">"#));
    }
}

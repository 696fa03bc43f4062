pub const SITE_TITLE: &str = "Liber";
pub const SITE_DESCRIPTION: &str =
    "Your personal drive to store, organize and share all your important links.";

const BASE_STYLES: &str = r#"
        :root { color-scheme: light; }
        * { box-sizing: border-box; }
        body { font-family: "Roboto", "Helvetica Neue", Arial, sans-serif; margin: 0; background: #fafaf9; color: #1c1917; min-height: 100vh; }
        a { color: inherit; }
        main { min-height: 100vh; }
        h1 { font-size: 32px; line-height: 40px; font-weight: 700; margin: 0; }
        .hidden { display: none !important; }
        .panel { width: 100%; max-width: 28rem; margin: 0 auto; display: flex; flex-direction: column; gap: 1rem; }
        .auth { display: flex; min-height: 100vh; padding: 4rem 1.75rem; }
        .description { margin: 0; color: #78716c; }
        .field { background: #f5f5f4; border-radius: 0.375rem; padding: 0.75rem; display: flex; align-items: center; }
        .field input { flex: 1; border: none; background: transparent; font-size: 1rem; padding: 0 0.25rem; }
        .field input:focus { outline: none; }
        .remember { display: flex; align-items: center; gap: 0.5rem; color: #44403c; font-size: 0.95rem; }
        button.primary { width: 100%; padding: 0.9rem 1.5rem; border: none; border-radius: 0.5rem; background: #1c1917; color: #fafaf9; font-size: 1rem; font-weight: 600; cursor: pointer; }
        button.primary:hover { background: #292524; }
        button.primary:disabled { opacity: 0.5; cursor: not-allowed; }
        .alt-link { margin-top: 2rem; color: #78716c; text-decoration: none; }
        .alt-link:hover { text-decoration: underline; }
        .prefix { color: #78716c; }
        .check { color: #22c55e; font-weight: 700; }
        .note { min-height: 1.5rem; font-size: 0.875rem; color: #ef4444; }
        .note.ok { color: #22c55e; }
        .claimed { margin: 0; color: #44403c; }
        .landing { display: flex; flex-direction: column; align-items: center; justify-content: center; gap: 4rem; padding: 5vw; min-height: 100vh; text-align: center; }
        .logo-badge { padding: 1.25rem 1.75rem; border-radius: 0.75rem; background: #a855f7; color: #ffffff; font-size: 1.5rem; font-weight: 600; }
        .landing h1 { font-size: clamp(37px, 5vw, 60px); line-height: 1.2; }
        .tagline { color: #6b7280; font-size: 1.25rem; margin: 0; }
        .cta-stack { display: flex; flex-direction: column; align-items: center; gap: 1rem; }
        .cta-primary { min-width: 300px; padding: 1.25rem 1.5rem; background: #1c1917; color: #fafaf9; border-radius: 1rem; font-size: 1.125rem; font-weight: 600; text-decoration: none; }
        .cta-primary:hover { background: #292524; }
        .cta-secondary { color: #747474; font-weight: 500; }
        .toast-root { position: fixed; bottom: 1.5rem; left: 50%; transform: translateX(-50%); display: flex; flex-direction: column; gap: 0.5rem; z-index: 50; }
        .toast { background: #1c1917; color: #fafaf9; padding: 0.75rem 1.25rem; border-radius: 0.5rem; box-shadow: 0 10px 30px rgba(28, 25, 23, 0.25); font-size: 0.95rem; }
        .profile { padding: 1.5rem; max-width: 1728px; margin: 0 auto; }
        .profile-grid { display: flex; flex-direction: column; gap: 2rem; padding-bottom: 7rem; }
        .avatar-frame { width: 11rem; height: 11rem; border-radius: 9999px; background: #f3f4f6; overflow: hidden; }
        .avatar-frame img { width: 100%; height: 100%; object-fit: cover; }
        .avatar-frame .placeholder { width: 100%; height: 100%; display: flex; align-items: center; justify-content: center; color: #9ca3af; font-size: 3rem; }
        .avatar-controls { display: flex; gap: 0.75rem; margin-top: 0.75rem; }
        .avatar-controls button, .avatar-upload { border: 1px solid #d6d3d1; background: #ffffff; border-radius: 0.5rem; padding: 0.4rem 0.9rem; font-size: 0.875rem; cursor: pointer; }
        .badge { display: inline-block; padding: 0.25rem 0.75rem; font-size: 0.75rem; text-transform: uppercase; background: #1c1917; color: #fafaf9; border-radius: 0.25rem; }
        .identity h1 { margin-top: 0.75rem; font-size: 44px; letter-spacing: -2px; }
        .bio { margin-top: 0.75rem; color: #565656; font-size: 1.25rem; }
        .card-grid { display: grid; grid-template-columns: repeat(2, 1fr); gap: 1rem; }
        .card { display: flex; align-items: center; gap: 0.75rem; border: 1px solid #e7e5e4; box-shadow: 0 1px 3px rgba(0, 0, 0, 0.08); padding: 0.75rem 1rem; border-radius: 1rem; background: #ffffff; text-decoration: none; }
        .card .glyph { padding: 0.5rem; border-radius: 0.5rem; background: #fef08a; }
        .card .label { font-weight: 500; overflow: hidden; text-overflow: ellipsis; white-space: nowrap; }
        .card .sub { color: #a8a29e; font-size: 0.75rem; overflow: hidden; text-overflow: ellipsis; white-space: nowrap; }
        .empty-state { display: flex; flex-direction: column; align-items: center; gap: 1rem; padding: 3rem 1rem; color: #ef4444; }
        .dock { position: fixed; bottom: 1.25rem; left: 50%; transform: translateX(-50%); display: flex; align-items: center; gap: 0.5rem; background: #ffffff; border: 1px solid #e7e5e4; border-radius: 1rem; box-shadow: 0 10px 30px rgba(0, 0, 0, 0.1); padding: 0.75rem; }
        .dock a, .dock button { padding: 0.5rem 0.9rem; border-radius: 0.75rem; text-decoration: none; border: none; background: transparent; font-size: 0.95rem; cursor: pointer; }
        .dock a.active { background: #f5f5f4; font-weight: 600; }
        .dock a:hover, .dock button:hover { background: #f5f5f4; }
        .error-page { display: flex; flex-direction: column; align-items: center; justify-content: center; min-height: 100vh; gap: 1rem; padding: 2rem; text-align: center; }
        .error-page p { color: #78716c; margin: 0; }
        @media (min-width: 1280px) {
            .profile { padding: 4rem; }
            .profile-grid { flex-direction: row; gap: 1.5rem; }
            .identity { flex: 1; }
            .content { width: 820px; flex: none; }
            .card-grid { grid-template-columns: repeat(3, 1fr); }
        }
"#;

const SHARED_SCRIPT: &str = r#"
function showToast(message) {
    const root = document.getElementById('toast-root');
    const toast = document.createElement('div');
    toast.className = 'toast';
    toast.textContent = message;
    root.appendChild(toast);
    setTimeout(() => toast.remove(), 4000);
}

async function postAction(form) {
    const body = new URLSearchParams(new FormData(form));
    try {
        const res = await fetch(form.action || window.location.pathname, {
            method: 'POST',
            headers: { 'Content-Type': 'application/x-www-form-urlencoded' },
            body,
            redirect: 'follow',
        });
        if (res.redirected) {
            window.location.href = res.url;
            return null;
        }
        return await res.json();
    } catch (err) {
        showToast('Something went wrong.');
        return null;
    }
}
"#;

const LOGIN_SCRIPT: &str = r#"
const loginForm = document.getElementById('login-form');
loginForm.addEventListener('submit', async (event) => {
    event.preventDefault();
    const data = await postAction(loginForm);
    if (data && data.ok === false) {
        showToast(data.message || 'Something went wrong.');
    }
});
"#;

pub(crate) const REGISTER_SCRIPT: &str = r#"
const DEBOUNCE_MS = 3000;
const handleInput = document.getElementById('username');
const availabilityNote = document.getElementById('availability-note');
const handleOk = document.getElementById('handle-ok');
const continueBtn = document.getElementById('continue');
let debounceTimer = null;

handleInput.addEventListener('input', () => {
    // strip special characters, whitespace becomes hyphens
    const value = handleInput.value.replace(/[^a-zA-Z0-9 -]/g, '').replace(/ /g, '-');
    handleInput.value = value;
    continueBtn.disabled = true;
    handleOk.classList.add('hidden');
    availabilityNote.textContent = '';
    availabilityNote.classList.remove('ok');
    if (debounceTimer) clearTimeout(debounceTimer);
    if (!value) return;
    debounceTimer = setTimeout(() => checkAvailability(value), DEBOUNCE_MS);
});

async function checkAvailability(value) {
    const body = new URLSearchParams({ __action: 'check-handle-availability', handle: value });
    const res = await fetch('/register', {
        method: 'POST',
        headers: { 'Content-Type': 'application/x-www-form-urlencoded' },
        body,
    });
    const data = await res.json();
    // latest input wins: drop replies for values the user has moved past
    if (handleInput.value !== value) return;
    if (data.isAvailable) {
        continueBtn.disabled = false;
        handleOk.classList.remove('hidden');
        availabilityNote.classList.add('ok');
        availabilityNote.textContent = data.message || 'This username is available.';
    } else {
        continueBtn.disabled = true;
        availabilityNote.textContent = data.message || 'This username is already taken.';
    }
}

continueBtn.addEventListener('click', () => {
    if (continueBtn.disabled) return;
    document.getElementById('handle-field').value = handleInput.value;
    document.getElementById('claimed-note').textContent =
        'liber.com/' + handleInput.value + ' is yours!';
    document.getElementById('step-1').classList.add('hidden');
    document.getElementById('step-2').classList.remove('hidden');
});

const registerForm = document.getElementById('register-form');
registerForm.addEventListener('submit', async (event) => {
    event.preventDefault();
    const data = await postAction(registerForm);
    if (!data) return;
    if (data.statusCode === 409) {
        showToast((data.message || 'Conflict') + '. Try again with another email id.');
    } else if (data.ok === false) {
        showToast(data.message || 'Something went wrong.');
    }
});
"#;

const AVATAR_SCRIPT: &str = r#"
const avatarInput = document.getElementById('avatar-input');
if (avatarInput) {
    avatarInput.addEventListener('change', () => {
        if (avatarInput.files.length) avatarInput.form.submit();
    });
}
"#;

/// Shared document shell: every page goes through here so styles, the toast
/// root and the shared fetch helper stay consistent.
pub fn render_page(title: &str, description: &str, body_html: &str, page_script: &str) -> String {
    let description = escape_html(description);
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>{title}</title>
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <meta name="og:title" content="{SITE_TITLE}">
    <meta name="description" content="{description}">
    <style>
{BASE_STYLES}
    </style>
</head>
<body>
{body_html}
    <div id="toast-root" class="toast-root"></div>
    <script>
{SHARED_SCRIPT}
{page_script}
    </script>
</body>
</html>"#,
        title = escape_html(title),
    )
}

pub fn render_landing_page() -> String {
    let body = format!(
        r#"    <main class="landing">
        <div class="logo-badge">{SITE_TITLE}</div>
        <h1>Manage all Your Links.<br>At One Place.</h1>
        <p class="tagline">{SITE_DESCRIPTION}</p>
        <div class="cta-stack">
            <a class="cta-primary" href="/register">Create your Liber</a>
            <a class="cta-secondary" href="/login">Log in</a>
        </div>
    </main>"#
    );

    render_page(
        &format!("{SITE_TITLE} - {SITE_DESCRIPTION}"),
        SITE_DESCRIPTION,
        &body,
        "",
    )
}

pub fn render_login_page() -> String {
    let body = r#"    <main class="auth">
        <section class="panel">
            <h1>Log in to your Liber.</h1>
            <p class="description">Good to have you back!</p>
            <form id="login-form" method="post" action="/login">
                <input type="hidden" name="__action" value="login">
                <div class="field">
                    <input type="email" id="email" name="email" placeholder="Email address"
                        autocomplete="email" spellcheck="false" required>
                </div>
                <div class="field" style="margin-top: 1rem;">
                    <input type="password" id="password" name="password" placeholder="Password"
                        autocomplete="off" spellcheck="false" required>
                </div>
                <label class="remember" style="margin-top: 1rem;">
                    <input type="checkbox" name="remember"> Remember me for a week
                </label>
                <button class="primary" type="submit" style="margin-top: 1.5rem;">Login</button>
            </form>
            <a class="alt-link" href="/register">or register</a>
        </section>
    </main>"#;

    render_page(
        &format!("{SITE_TITLE} - Login"),
        "Login to your account.",
        body,
        LOGIN_SCRIPT,
    )
}

pub fn render_register_page() -> String {
    let body = r#"    <main class="auth">
        <section class="panel" id="step-1">
            <h1>First, claim your username.</h1>
            <p class="description">The creative ones are still available!</p>
            <div class="field">
                <span class="prefix">liber.com/</span>
                <input type="text" id="username" name="username" placeholder="your-name"
                    autocomplete="off" spellcheck="false" required>
                <span id="handle-ok" class="check hidden">&#10003;</span>
            </div>
            <div id="availability-note" class="note"></div>
            <button class="primary" id="continue" disabled>Continue</button>
            <a class="alt-link" href="/login">or log in</a>
        </section>
        <section class="panel hidden" id="step-2">
            <p id="claimed-note" class="claimed"></p>
            <h1>Now, create your account.</h1>
            <form id="register-form" method="post" action="/register">
                <input type="hidden" name="__action" value="register">
                <input type="hidden" id="handle-field" name="handle" value="">
                <div class="field">
                    <input type="text" id="name" name="name" placeholder="Enter your name"
                        autocomplete="name" spellcheck="false" required>
                </div>
                <div class="field" style="margin-top: 1rem;">
                    <input type="email" id="email" name="email" placeholder="Email address"
                        autocomplete="email" spellcheck="false" required>
                </div>
                <div class="field" style="margin-top: 1rem;">
                    <input type="password" id="password" name="password" placeholder="Password"
                        autocomplete="off" spellcheck="false" required>
                </div>
                <button class="primary" type="submit" style="margin-top: 1.5rem;">Register</button>
            </form>
            <a class="alt-link" href="/login">or log in</a>
        </section>
    </main>"#;

    render_page(
        &format!("{SITE_TITLE} - Register"),
        "Register now to get started.",
        body,
        REGISTER_SCRIPT,
    )
}

pub fn avatar_script() -> &'static str {
    AVATAR_SCRIPT
}

pub fn render_not_found_page(handle: &str) -> String {
    let body = format!(
        r#"    <main class="error-page">
        <h1>User does not exist.</h1>
        <p>Nobody has claimed liber.com/{handle} yet.</p>
        <a class="cta-primary" href="/register">Claim it now</a>
    </main>"#,
        handle = escape_html(handle),
    );

    render_page(handle, "User does not exist.", &body, "")
}

pub fn render_error_page(message: &str) -> String {
    let body = format!(
        r#"    <main class="error-page">
        <h1>Something went wrong.</h1>
        <p>{message}</p>
        <a class="cta-secondary" href="/">Back to home</a>
    </main>"#,
        message = escape_html(message),
    );

    render_page(SITE_TITLE, SITE_DESCRIPTION, &body, "")
}

pub fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_html_covers_all_specials() {
        assert_eq!(
            escape_html(r#"<img src="x" onerror='alert(&1)'>"#),
            "&lt;img src=&quot;x&quot; onerror=&#39;alert(&amp;1)&#39;&gt;"
        );
    }

    #[test]
    fn register_wizard_debounces_three_seconds() {
        assert!(REGISTER_SCRIPT.contains("DEBOUNCE_MS = 3000"));
        assert!(REGISTER_SCRIPT.contains("clearTimeout(debounceTimer)"));
    }

    #[test]
    fn register_wizard_discards_stale_availability_responses() {
        // The check is async; a response for an outdated input value must be
        // dropped so only the latest keystroke decides the wizard state.
        assert!(REGISTER_SCRIPT.contains("if (handleInput.value !== value) return;"));
    }

    #[test]
    fn page_shell_escapes_title() {
        let page = render_page("<script>", "desc", "", "");
        assert!(page.contains("<title>&lt;script&gt;</title>"));
    }

    #[test]
    fn login_page_posts_the_login_action() {
        let page = render_login_page();
        assert!(page.contains(r#"name="__action" value="login""#));
        assert!(page.contains(r#"name="remember""#));
    }

    #[test]
    fn register_page_has_both_wizard_steps() {
        let page = render_register_page();
        assert!(page.contains(r#"id="step-1""#));
        assert!(page.contains(r#"id="step-2""#));
        assert!(page.contains(r#"name="__action" value="register""#));
    }
}

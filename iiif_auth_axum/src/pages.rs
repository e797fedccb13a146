//! HTML served into access service windows
//!
//! Every value that reaches a `<script>` block is JSON-encoded with the
//! characters that could close the block escaped. Every value that reaches
//! markup is HTML-escaped.

use std::time::Duration;

use axum::http::{header, HeaderMap};
use iiif_auth::{AccessServiceDescriptor, LanguageMap, Locale, OpenerNotice, OriginRef};
use serde::Serialize;
use url::Url;

/// Escapes text for use in HTML content and attribute values
pub(crate) fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Encodes a value as a JSON literal safe to embed in a `<script>` block
pub(crate) fn script_json<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    Ok(serde_json::to_string(value)?
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026")
        .replace('\u{2028}', "\\u2028")
        .replace('\u{2029}', "\\u2029"))
}

/// The locale of a request: `locale` parameter, then cookie, then
/// `Accept-Language`
pub(crate) fn request_locale(param: Option<&str>, headers: &HeaderMap) -> Locale {
    let cookie = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == "locale")
        .map(|(_, value)| value);
    let accept_language = headers
        .get(header::ACCEPT_LANGUAGE)
        .and_then(|v| v.to_str().ok());

    Locale::negotiate(param, cookie, accept_language)
}

fn layout(locale: Locale, title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="{lang}">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<style>
body {{ font-family: system-ui, sans-serif; max-width: 28rem; margin: 3rem auto; padding: 0 1rem; color: #222; }}
.error {{ color: #b00020; }}
label {{ display: block; margin-top: 1rem; }}
input {{ width: 100%; padding: .4rem; }}
.actions {{ margin-top: 1.5rem; display: flex; gap: 1rem; }}
</style>
</head>
<body>
{body}
</body>
</html>
"#,
        lang = locale.as_str(),
        title = escape_html(title),
    )
}

fn text(map: &LanguageMap, locale: Locale) -> String {
    escape_html(&map.text(locale))
}

struct FormLabels {
    username: &'static str,
    password: &'static str,
    accept: &'static str,
    decline: &'static str,
    closing: &'static str,
}

impl FormLabels {
    fn for_locale(locale: Locale) -> Self {
        match locale {
            Locale::En => Self {
                username: "Username",
                password: "Password",
                accept: "Accept",
                decline: "Decline",
                closing: "This window will close automatically.",
            },
            Locale::Ja => Self {
                username: "ユーザー名",
                password: "パスワード",
                accept: "同意する",
                decline: "同意しない",
                closing: "このウィンドウは自動的に閉じます。",
            },
        }
    }
}

/// The kiosk terms of use
#[derive(Clone, Copy, Debug)]
struct KioskTerms {
    description: &'static str,
    title: &'static str,
    terms: [&'static str; 4],
}

impl KioskTerms {
    fn for_locale(locale: Locale) -> Self {
        match locale {
            Locale::En => Self {
                description: "This content is provided under specific terms and conditions. \
                    By clicking \"Accept\", you acknowledge that you have read and agree to these terms.",
                title: "Kiosk Access Terms:",
                terms: [
                    "This is a demonstration of IIIF Authentication API 2.0 Kiosk Pattern",
                    "Access is granted for this browser session only",
                    "No login credentials are required",
                    "Content is for demonstration purposes only",
                ],
            },
            Locale::Ja => Self {
                description: "このコンテンツは特定の利用規約の下で提供されています。\
                    「同意」をクリックすることで、これらの規約を読み、同意したことを確認します。",
                title: "キオスクアクセス規約：",
                terms: [
                    "これはIIIF認証API 2.0キオスクパターンのデモンストレーションです",
                    "アクセスは現在のブラウザセッションのみ有効です",
                    "ログイン認証情報は不要です",
                    "コンテンツはデモンストレーション目的でのみ提供されています",
                ],
            },
        }
    }
}

/// A failed login attempt to report on the form
#[derive(Clone, Copy, Debug)]
pub(crate) struct FormError<'a> {
    pub(crate) heading: &'a LanguageMap,
    pub(crate) note: &'a LanguageMap,
}

/// The interactive login form
pub(crate) fn login_form(
    locale: Locale,
    service: &AccessServiceDescriptor,
    action: &Url,
    hidden: &[(&str, &str)],
    error: Option<FormError<'_>>,
) -> String {
    let labels = FormLabels::for_locale(locale);

    let mut body = format!(
        "<h1>{}</h1>\n<p>{}</p>\n",
        text(&service.heading, locale),
        text(&service.note, locale)
    );

    if let Some(error) = error {
        body.push_str(&format!(
            "<div class=\"error\" role=\"alert\"><strong>{}</strong><p>{}</p></div>\n",
            text(error.heading, locale),
            text(error.note, locale)
        ));
    }

    body.push_str(&format!(
        "<form method=\"post\" action=\"{}\">\n",
        escape_html(action.as_str())
    ));
    for (name, value) in hidden {
        body.push_str(&format!(
            "<input type=\"hidden\" name=\"{}\" value=\"{}\">\n",
            escape_html(name),
            escape_html(value)
        ));
    }
    body.push_str(&format!(
        concat!(
            "<label>{username}<input name=\"username\" autocomplete=\"username\" required></label>\n",
            "<label>{password}<input name=\"password\" type=\"password\" autocomplete=\"current-password\" required></label>\n",
            "<div class=\"actions\"><button type=\"submit\">{confirm}</button></div>\n",
            "</form>\n"
        ),
        username = labels.username,
        password = labels.password,
        confirm = text(&service.confirm_label, locale),
    ));

    layout(locale, &service.label.text(locale), &body)
}

/// The kiosk terms of use, with links to accept or decline
pub(crate) fn kiosk_terms(
    locale: Locale,
    service: &AccessServiceDescriptor,
    accept: &Url,
    decline: &Url,
) -> String {
    let labels = FormLabels::for_locale(locale);
    let terms = KioskTerms::for_locale(locale);
    let items: String = terms
        .terms
        .iter()
        .map(|term| format!("<li>{}</li>", escape_html(term)))
        .collect();

    let body = format!(
        concat!(
            "<h1>{heading}</h1>\n<p>{note}</p>\n<p>{description}</p>\n",
            "<div class=\"terms\"><p><strong>{terms_title}</strong></p><ul>{items}</ul></div>\n",
            "<div class=\"actions\">",
            "<a href=\"{accept}\"><button type=\"button\">{confirm}</button></a>",
            "<a href=\"{decline}\"><button type=\"button\">{decline_label}</button></a>",
            "</div>\n"
        ),
        heading = text(&service.heading, locale),
        note = text(&service.note, locale),
        description = escape_html(terms.description),
        terms_title = escape_html(terms.title),
        items = items,
        accept = escape_html(accept.as_str()),
        confirm = if service.confirm_label.is_empty() {
            labels.accept.to_owned()
        } else {
            text(&service.confirm_label, locale)
        },
        decline = escape_html(decline.as_str()),
        decline_label = labels.decline,
    );

    layout(locale, &service.label.text(locale), &body)
}

/// A page that posts `payload` to the opener at exactly `target`, then
/// closes itself
///
/// Without an opener the page navigates to `fallback`, when given.
pub(crate) fn post_to_opener<T: Serialize + ?Sized>(
    locale: Locale,
    title: &str,
    target: &OriginRef,
    payload: &T,
    close_after: Duration,
    fallback: Option<&Url>,
) -> Result<String, serde_json::Error> {
    let labels = FormLabels::for_locale(locale);
    let fallback = match fallback {
        Some(url) => format!("window.location.href = {};", script_json(url.as_str())?),
        None => String::new(),
    };

    let body = format!(
        r#"<p>{closing}</p>
<script>
(function () {{
  var payload = {payload};
  var target = {target};
  if (window.opener) {{
    window.opener.postMessage(payload, target);
    setTimeout(function () {{ window.close(); }}, {delay});
  }} else {{
    {fallback}
  }}
}})();
</script>
"#,
        closing = labels.closing,
        payload = script_json(payload)?,
        target = script_json(target.as_str())?,
        delay = close_after.as_millis(),
    );

    Ok(layout(locale, title, &body))
}

/// A page that closes itself without posting anything
///
/// Without an opener the page navigates to `fallback`, when given.
pub(crate) fn close_silently(
    locale: Locale,
    title: &str,
    fallback: Option<&Url>,
) -> Result<String, serde_json::Error> {
    let labels = FormLabels::for_locale(locale);
    let script = match fallback {
        Some(url) => format!(
            "if (window.opener) {{ window.close(); }} else {{ window.location.href = {}; }}",
            script_json(url.as_str())?
        ),
        None => "window.close();".to_owned(),
    };

    Ok(layout(
        locale,
        title,
        &format!("<p>{}</p>\n<script>{script}</script>\n", labels.closing),
    ))
}

/// Renders `notice`, or a silent close when there is none
pub(crate) fn notice_page(
    locale: Locale,
    title: &str,
    notice: Option<&OpenerNotice>,
    fallback: Option<&Url>,
) -> Result<String, serde_json::Error> {
    match notice {
        Some(n) => post_to_opener(
            locale,
            title,
            &n.target_origin,
            &n.message,
            n.close_after,
            fallback,
        ),
        None => close_silently(locale, title, fallback),
    }
}

#[cfg(test)]
mod tests {
    use iiif_auth::{AccessPattern, Origin, ServiceCatalog};

    use super::*;

    #[test]
    fn script_values_cannot_close_the_script_block() -> color_eyre::Result<()> {
        let encoded = script_json("</script><script>alert(1)</script>")?;
        assert!(!encoded.contains('<'));
        assert!(!encoded.contains('>'));
        assert_eq!(
            serde_json::from_str::<String>(&encoded)?,
            "</script><script>alert(1)</script>"
        );
        Ok(())
    }

    #[test]
    fn posted_message_targets_the_exact_origin() -> color_eyre::Result<()> {
        let origin = Origin::parse("https://viewer.example")?;
        let page = post_to_opener(
            Locale::En,
            "Token",
            &origin,
            &serde_json::json!({ "messageId": "m-1" }),
            Duration::from_millis(100),
            None,
        )?;

        assert!(page.contains(r#"var target = "https://viewer.example";"#));
        assert!(page.contains("setTimeout(function () { window.close(); }, 100);"));
        assert!(!page.contains(r#""*""#));
        Ok(())
    }

    #[test]
    fn form_markup_is_escaped() -> color_eyre::Result<()> {
        let catalog = ServiceCatalog::new(Url::parse("http://localhost:3000")?);
        let service = catalog.access_service(AccessPattern::Interactive, false);
        let page = login_form(
            Locale::Ja,
            &service,
            &catalog.auth_page_url(),
            &[("origin", "\"><script>")],
            None,
        );

        assert!(page.contains("&quot;&gt;&lt;script&gt;"));
        assert!(page.contains("ユーザー名"));
        assert!(page.contains(r#"<html lang="ja">"#));
        Ok(())
    }

    #[test]
    fn kiosk_terms_are_listed_in_the_requested_language() -> color_eyre::Result<()> {
        let catalog = ServiceCatalog::new(Url::parse("http://localhost:3000")?);
        let service = catalog.access_service(AccessPattern::Kiosk, false);
        let accept = Url::parse("http://localhost:3000/api/iiif/auth/kiosk/accept")?;
        let decline = Url::parse("http://localhost:3000/api/iiif/auth/kiosk/decline")?;

        let page = kiosk_terms(Locale::En, &service, &accept, &decline);
        assert!(page.contains("Kiosk Access Terms:"));
        assert!(page.contains("<li>Access is granted for this browser session only</li>"));
        assert!(page.contains("<li>No login credentials are required</li>"));

        let page = kiosk_terms(Locale::Ja, &service, &accept, &decline);
        assert!(page.contains("キオスクアクセス規約："));
        assert!(page.contains("<li>ログイン認証情報は不要です</li>"));
        Ok(())
    }

    #[test]
    fn locale_comes_from_parameter_then_cookie_then_header() -> color_eyre::Result<()> {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT_LANGUAGE, "ja,en;q=0.5".parse()?);
        assert_eq!(request_locale(None, &headers), Locale::Ja);

        headers.insert(header::COOKIE, "theme=dark; locale=en".parse()?);
        assert_eq!(request_locale(None, &headers), Locale::En);
        assert_eq!(request_locale(Some("ja"), &headers), Locale::Ja);
        Ok(())
    }
}

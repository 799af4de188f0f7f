use std::collections::HashSet;

use regex::{Captures, Regex};

/// Send-time and delivery-time formatting of chat message bodies.
pub struct MessageRenderer {
    mention: Regex,
    url: Regex,
}

impl MessageRenderer {
    pub fn new() -> Self {
        MessageRenderer {
            mention: Regex::new(r"@([a-zA-Z0-9_]+)").expect("mention pattern"),
            url: Regex::new(r"https?://(?:[-\w.]|(?:%[\da-fA-F]{2}))+").expect("url pattern"),
        }
    }

    /// Send-time pass: highlight mentions of currently online users, leave
    /// offline mentions as plain text, then run URL detection. The URL pass
    /// substitutes each detected URL with itself — links are deliberately
    /// left unchanged on the wire.
    pub fn render_message(&self, text: &str, online: &HashSet<String>) -> String {
        let mentioned = self.mention.replace_all(text, |caps: &Captures| {
            let username = &caps[1];
            if online.contains(username) {
                highlight(username)
            } else {
                format!("@{username}")
            }
        });

        let mut rendered = mentioned.into_owned();
        let urls: Vec<String> = self
            .url
            .find_iter(&rendered)
            .map(|m| m.as_str().to_string())
            .collect();
        for url in urls {
            rendered = rendered.replace(&url, &url);
        }
        rendered
    }

    /// Delivery-time pass over a stored fragment: re-run mention matching
    /// and highlight only the viewer's own nickname. Mentions of other users
    /// keep whatever the send-time pass produced.
    pub fn personalize(&self, raw: &str, viewer: &str) -> String {
        self.mention
            .replace_all(raw, |caps: &Captures| {
                let username = &caps[1];
                if username == viewer {
                    highlight(username)
                } else {
                    format!("@{username}")
                }
            })
            .into_owned()
    }
}

impl Default for MessageRenderer {
    fn default() -> Self {
        Self::new()
    }
}

fn highlight(username: &str) -> String {
    format!("<span style='color: blue'>@{username}</span>")
}

/// Grey message card wrapping a user-authored message.
pub fn user_html(sender: &str, body: &str) -> String {
    format!(
        "<div style=\"background-color: #f0f0f0; padding: 10px; margin-bottom: 10px; \
         border-radius: 10px; box-shadow: 0 2px 4px rgba(0, 0, 0, 0.1);\">\n    \
         <strong>{sender}</strong>: {body}\n</div>"
    )
}

/// Italic cyan card wrapping a platform notice.
pub fn system_html(text: &str) -> String {
    format!(
        "<div style=\"background-color: #e0f7fa; padding: 10px; margin-bottom: 10px; \
         border-radius: 10px; font-style: italic;\">\n    📢 {text}\n</div>"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn online(names: &[&str]) -> HashSet<String> {
        names.iter().map(|n| (*n).to_string()).collect()
    }

    #[test]
    fn online_mention_is_highlighted() {
        let renderer = MessageRenderer::new();
        let out = renderer.render_message("hello @bob", &online(&["bob"]));
        assert_eq!(out, "hello <span style='color: blue'>@bob</span>");
    }

    #[test]
    fn offline_mention_stays_plain() {
        let renderer = MessageRenderer::new();
        let out = renderer.render_message("hello @bob", &online(&["alice"]));
        assert_eq!(out, "hello @bob");
    }

    #[test]
    fn mixed_mentions_render_independently() {
        let renderer = MessageRenderer::new();
        let out = renderer.render_message("@bob meet @carol", &online(&["bob"]));
        assert_eq!(
            out,
            "<span style='color: blue'>@bob</span> meet @carol"
        );
    }

    #[test]
    fn urls_pass_through_unchanged() {
        let renderer = MessageRenderer::new();
        let text = "check this out http://example.com";
        assert_eq!(renderer.render_message(text, &online(&[])), text);

        let https = "see https://example.com/a%2Fb.html too";
        assert_eq!(renderer.render_message(https, &online(&[])), https);
    }

    #[test]
    fn personalize_highlights_only_the_viewer() {
        let renderer = MessageRenderer::new();
        let out = renderer.personalize("ping @bob and @carol", "bob");
        assert_eq!(
            out,
            "ping <span style='color: blue'>@bob</span> and @carol"
        );
    }

    #[test]
    fn personalize_keeps_send_time_highlight_for_others() {
        let renderer = MessageRenderer::new();
        let stored = "hi <span style='color: blue'>@bob</span>";
        // The viewer is not bob; the inner token is rewritten to itself and
        // the surrounding span from the send-time pass survives.
        assert_eq!(renderer.personalize(stored, "carol"), stored);
    }

    #[test]
    fn message_templates_wrap_sender_and_body() {
        let card = user_html("alice", "hi there");
        assert!(card.contains("<strong>alice</strong>: hi there"));

        let notice = system_html("`alice` joined the chat!");
        assert!(notice.contains("📢 `alice` joined the chat!"));
        assert!(notice.contains("font-style: italic"));
    }
}

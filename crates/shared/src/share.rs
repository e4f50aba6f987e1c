use serde::{Deserialize, Serialize};
use url::Url;

use crate::domain::{Letter, ShortId};

const TWITTER_INTENT: &str = "https://twitter.com/intent/tweet";
const FACEBOOK_SHARER: &str = "https://www.facebook.com/sharer/sharer.php";
const WHATSAPP_SEND: &str = "https://wa.me/";

pub const DEFAULT_SHARE_DESCRIPTION: &str = "I made this digital bouquet for you";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareLinks {
    pub url: String,
    pub title: String,
    pub description: String,
    pub twitter: String,
    pub facebook: String,
    pub whatsapp: String,
}

pub fn bouquet_url(public_base_url: &str, short_id: &ShortId) -> String {
    format!(
        "{}/bouquet/{}",
        public_base_url.trim_end_matches('/'),
        short_id
    )
}

pub fn share_title(letter: &Letter) -> String {
    let sender = letter.sender.trim();
    let sender = if sender.is_empty() {
        "someone special"
    } else {
        sender
    };
    format!("Check out this beautiful bouquet from {sender}!")
}

pub fn share_links(
    public_base_url: &str,
    short_id: &ShortId,
    letter: &Letter,
) -> Result<ShareLinks, url::ParseError> {
    let url = bouquet_url(public_base_url, short_id);
    let title = share_title(letter);
    let description = if letter.message.trim().is_empty() {
        DEFAULT_SHARE_DESCRIPTION.to_string()
    } else {
        letter.message.clone()
    };

    let twitter = Url::parse_with_params(TWITTER_INTENT, &[("text", &title), ("url", &url)])?;
    let facebook = Url::parse_with_params(FACEBOOK_SHARER, &[("u", &url)])?;
    let whatsapp = Url::parse_with_params(WHATSAPP_SEND, &[("text", format!("{title} {url}"))])?;

    Ok(ShareLinks {
        url,
        title,
        description,
        twitter: twitter.into(),
        facebook: facebook.into(),
        whatsapp: whatsapp.into(),
    })
}

//! The fixed navigation keyboards, one button per row.

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use url::Url;

/// Callback data of the cart-discount button.
pub const CART_CALLBACK: &str = "click";

const REVIEW_PAGE_URL: &str = "https://s.click.aliexpress.com/e/_DdwUZVd";
const CHANNEL_URL: &str = "https://t.me/ShopAliExpressMaroc";
const HOW_IT_WORKS_URL: &str = "https://t.me/ShopAliExpressMaroc/9";

const REVIEW_PAGE_LABEL: &str = "⭐️ صفحة مراجعة وجمع النقاط يوميا ⭐️";
const CART_LABEL: &str = "⭐️تخفيض العملات على منتجات السلة 🛒⭐️";
const CHANNEL_LABEL: &str = "❤️ اشترك في القناة للمزيد من العروض ❤️";
const HOW_IT_WORKS_LABEL: &str = "🎬 شاهد كيفية عمل البوت 🎬";

const GAMES: [(&str, &str); 4] = [
    ("⭐️ لعبة Merge boss ⭐️", "https://s.click.aliexpress.com/e/_DlCyg5Z"),
    ("⭐️ لعبة Fantastic Farm ⭐️", "https://s.click.aliexpress.com/e/_DBBkt9V"),
    ("⭐️ لعبة قلب الاوراق Flip ⭐️", "https://s.click.aliexpress.com/e/_DdcXZ2r"),
    ("⭐️ لعبة GoGo Match ⭐️", "https://s.click.aliexpress.com/e/_DDs7W5D"),
];

fn url_button(label: &str, url: &str) -> InlineKeyboardButton {
    InlineKeyboardButton::url(label, Url::parse(url).expect("valid button url"))
}

/// Keyboard attached to the `/start` welcome message.
pub fn start_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![url_button(REVIEW_PAGE_LABEL, REVIEW_PAGE_URL)],
        vec![InlineKeyboardButton::callback(CART_LABEL, CART_CALLBACK)],
        vec![url_button(CHANNEL_LABEL, CHANNEL_URL)],
        vec![url_button(HOW_IT_WORKS_LABEL, HOW_IT_WORKS_URL)],
    ])
}

/// Keyboard attached to every deal reply.
pub fn deal_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![url_button(REVIEW_PAGE_LABEL, REVIEW_PAGE_URL)],
        vec![InlineKeyboardButton::callback(CART_LABEL, CART_CALLBACK)],
        vec![url_button(CHANNEL_LABEL, CHANNEL_URL)],
    ])
}

/// Keyboard of the coin-games reply.
pub fn games_keyboard() -> InlineKeyboardMarkup {
    let mut rows = vec![vec![url_button(REVIEW_PAGE_LABEL, REVIEW_PAGE_URL)]];
    for (label, url) in GAMES {
        rows.push(vec![url_button(label, url)]);
    }
    InlineKeyboardMarkup::new(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyboards_have_expected_row_counts() {
        assert_eq!(start_keyboard().inline_keyboard.len(), 4);
        assert_eq!(deal_keyboard().inline_keyboard.len(), 3);
        assert_eq!(games_keyboard().inline_keyboard.len(), 5);
    }

    #[test]
    fn every_button_sits_in_its_own_row() {
        for keyboard in [start_keyboard(), deal_keyboard(), games_keyboard()] {
            assert!(keyboard.inline_keyboard.iter().all(|row| row.len() == 1));
        }
    }
}

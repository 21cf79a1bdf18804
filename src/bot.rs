use std::sync::Arc;

use anyhow::Result;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::{InputFile, ParseMode};
use tracing::{error, info, warn};
use url::Url;

use crate::affiliate::AffiliateClient;
use crate::compose;
use crate::config::Config;
use crate::deals::{self, DealError};
use crate::extract;
use crate::keyboards;
use crate::rates::RateClient;
use crate::resolve::LinkResolver;

/// Shared application state: configuration plus the remote-API clients.
/// Everything is immutable; requests are independent units of work.
pub struct AppState {
    pub config: Config,
    pub affiliate: AffiliateClient,
    pub rates: RateClient,
    pub resolver: LinkResolver,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        let affiliate = AffiliateClient::new(&config.affiliate)?;
        let rates = RateClient::new(&config.exchange)?;
        let resolver = LinkResolver::new()?;
        Ok(Self {
            config,
            affiliate,
            rates,
            resolver,
        })
    }
}

/// The dispatcher tree: text messages and callback-query buttons.
pub fn handler_tree() -> UpdateHandler<teloxide::RequestError> {
    dptree::entry()
        .branch(Update::filter_message().endpoint(handle_message))
        .branch(Update::filter_callback_query().endpoint(handle_callback))
}

async fn handle_message(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let text = match msg.text() {
        Some(t) => t.to_string(),
        None => return Ok(()),
    };

    info!("Message from chat {}: {}", msg.chat.id, text);

    if text == "/start" {
        bot.send_message(msg.chat.id, compose::WELCOME)
            .reply_markup(keyboards::start_keyboard())
            .await?;
        return Ok(());
    }

    let link = extract::first_link(&text).map(str::to_string);
    let waiting = bot.send_message(msg.chat.id, compose::WAIT).await?;
    let lowered = text.to_lowercase();

    let link = match link {
        Some(link)
            if link.to_lowercase().contains("aliexpress.com")
                && !lowered.contains("p/shoppingcart") =>
        {
            link
        }
        _ => {
            bot.delete_message(msg.chat.id, waiting.id).await?;
            bot.send_message(msg.chat.id, compose::INVALID_LINK)
                .parse_mode(ParseMode::Html)
                .await?;
            return Ok(());
        }
    };

    if lowered.contains("availableproductshopcartids") {
        bot.delete_message(msg.chat.id, waiting.id).await?;
        return send_cart_link(&bot, msg.chat.id, &state, &link).await;
    }

    match deals::build_reply(&state.affiliate, &state.rates, &state.resolver, &link).await {
        Ok(reply) => {
            bot.delete_message(msg.chat.id, waiting.id).await?;
            match reply.photo {
                Some(photo) => {
                    bot.send_photo(msg.chat.id, InputFile::url(photo))
                        .caption(reply.caption)
                        .reply_markup(keyboards::deal_keyboard())
                        .await?;
                }
                None => {
                    bot.send_message(msg.chat.id, reply.caption)
                        .reply_markup(keyboards::deal_keyboard())
                        .await?;
                }
            }
        }
        Err(DealError::NoProductId { link }) => {
            warn!("No product identifier in {}", link);
            bot.delete_message(msg.chat.id, waiting.id).await?;
            bot.send_message(msg.chat.id, compose::NO_PRODUCT_ID).await?;
        }
    }

    Ok(())
}

async fn handle_callback(bot: Bot, query: CallbackQuery, state: Arc<AppState>) -> ResponseResult<()> {
    let chat_id = match query.message.as_ref() {
        Some(message) => message.chat().id,
        None => return Ok(()),
    };
    let data = query.data.unwrap_or_default();

    info!("Callback query from chat {}: {}", chat_id, data);

    if data == keyboards::CART_CALLBACK {
        return send_cart_link(&bot, chat_id, &state, deals::CART_INDEX_URL).await;
    }

    bot.send_message(chat_id, compose::GAMES_PLACEHOLDER).await?;
    let games_image = Url::parse(compose::GAMES_IMAGE).expect("valid games image url");
    bot.send_photo(chat_id, InputFile::url(games_image))
        .caption(compose::GAMES_CAPTION)
        .reply_markup(keyboards::games_keyboard())
        .await?;

    Ok(())
}

/// Converts a cart page into a cart-discount promotion link and sends it;
/// failure degrades to the generic error reply.
async fn send_cart_link(
    bot: &Bot,
    chat_id: ChatId,
    state: &AppState,
    link: &str,
) -> ResponseResult<()> {
    let target = deals::shopcart_target(link);
    match state.affiliate.promotion_link(&target).await {
        Ok(promo) => {
            let cart_image = Url::parse(compose::CART_IMAGE).expect("valid cart image url");
            bot.send_photo(chat_id, InputFile::url(cart_image))
                .caption(compose::cart_caption(&promo))
                .await?;
        }
        Err(e) => {
            error!("Cart link generation failed: {:#}", e);
            bot.send_message(chat_id, compose::GENERIC_ERROR).await?;
        }
    }
    Ok(())
}

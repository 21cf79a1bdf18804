//! User-facing message texts and caption assembly.
//!
//! The reply caption is built in a fixed order: title + bilingual price (or
//! the generic lead line) → coin → bundle → super → limited → hashtag
//! footer. Variants that failed to generate are simply omitted.

use crate::deals::AffiliateLinks;

pub const WELCOME: &str = "مرحبا بكم 👋\n\
     أنا علي إكسبريس بوت أقوم بتخفيض المنتجات والبحث عن أفضل العروض.\n\
     انسخ رابط المنتج وضعه هنا 👇 ستجد جميع عروض المنتج بثمن أقل 🔥";

pub const WAIT: &str = "المرجو الانتظار قليلا، يتم تجهيز العروض ⏳";

/// Sent with HTML parse mode for the bold fragment.
pub const INVALID_LINK: &str = "الرابط غير صحيح! تأكد من رابط المنتج أو أعد المحاولة.\n\
     قم بإرسال <b>الرابط فقط</b> بدون عنوان المنتج.";

pub const NO_PRODUCT_ID: &str = "❌ لم أتمكن من استخراج معرف المنتج من الرابط.";

pub const GENERIC_ERROR: &str = "حدث خطأ 🤷🏻‍♂️";

pub const GAMES_PLACEHOLDER: &str = "..";

pub const GAMES_CAPTION: &str = "روابط ألعاب جمع العملات المعدنية لإستعمالها في خفض السعر لبعض \
     المنتجات، قم بالدخول يوميا لها للحصول على أكبر عدد ممكن في اليوم 👇";

pub const LEAD_COMPARE: &str = "قارن بين الأسعار واشتري 🔥";

pub const HASHTAG_FOOTER: &str = "#AliExpressSaverBot ✅";

pub const CART_IMAGE: &str =
    "https://i.postimg.cc/1Xrk1RJP/Copy-of-Basket-aliexpress-telegram.png";

pub const GAMES_IMAGE: &str = "https://i.postimg.cc/VvmhgQ1h/Basket-aliexpress-telegram.png";

const BOT_PROMO: &str =
    "استخدموا بوتنا الرائع للحصول على جميع الروابط والأسعار بسهولة: 🤖 t.me/AliExpressSaverBot";

/// Product detail reduced to what the caption needs; `price_local` is only
/// set when the exchange-rate fetch succeeded.
#[derive(Debug, Clone)]
pub struct PricedProduct {
    pub title: String,
    pub price_usd: f64,
    pub price_local: Option<f64>,
}

/// `12.34 دولار 💵 / 123.40 درهم مغربي 💵`, or USD only without a rate.
pub fn bilingual_price(price_usd: f64, price_local: Option<f64>) -> String {
    match price_local {
        Some(local) => format!("{price_usd:.2} دولار 💵 / {local:.2} درهم مغربي 💵"),
        None => format!("{price_usd:.2} دولار 💵"),
    }
}

pub fn deal_caption(product: Option<&PricedProduct>, links: &AffiliateLinks) -> String {
    let mut caption = String::new();
    match product {
        Some(p) => {
            caption.push_str("🛒 منتجك هو : 🔥\n");
            caption.push_str(&p.title);
            caption.push_str(" 🛍\n");
            caption.push_str("سعر المنتج : ");
            caption.push_str(&bilingual_price(p.price_usd, p.price_local));
            caption.push('\n');
            caption.push_str(LEAD_COMPARE);
            caption.push('\n');
        }
        None => {
            caption.push_str(LEAD_COMPARE);
            caption.push('\n');
        }
    }
    push_variant(&mut caption, "💰 عرض العملات (السعر النهائي عند الدفع):", links.coin.as_deref());
    push_variant(&mut caption, "📦 عرض الحزمة (عروض متنوعة):", links.bundle.as_deref());
    push_variant(&mut caption, "💎 عرض السوبر:", links.super_deal.as_deref());
    push_variant(&mut caption, "🔥 عرض محدود:", links.limited.as_deref());
    caption.push('\n');
    caption.push_str(HASHTAG_FOOTER);
    caption
}

fn push_variant(caption: &mut String, label: &str, link: Option<&str>) {
    if let Some(link) = link {
        caption.push('\n');
        caption.push_str(label);
        caption.push('\n');
        caption.push_str(link);
        caption.push('\n');
    }
}

pub fn cart_caption(link: &str) -> String {
    format!("هذا رابط تخفيض السلة {link}")
}

/// Caption for one channel post: title, bilingual price, rating, link,
/// bot-promotion line, channel tag.
pub fn channel_caption(
    title: &str,
    price_usd: Option<f64>,
    rate: Option<f64>,
    rating: Option<&str>,
    link: &str,
    channel_tag: &str,
) -> String {
    let mut caption = String::from("🔥 منتج جديد! 🔥\n\n");
    caption.push_str(&format!("📌 {title}\n\n"));
    if let Some(usd) = price_usd {
        match rate {
            Some(rate) => {
                caption.push_str(&format!("💰 السعر: ${usd:.2} دولار / {:.2} درهم\n", usd * rate));
            }
            None => caption.push_str(&format!("💰 السعر: ${usd:.2} دولار\n")),
        }
    }
    if let Some(rating) = rating {
        caption.push_str(&format!("⭐ التقييم: {rating}\n"));
    }
    caption.push_str(&format!("🔗 الرابط: {link}\n\n"));
    caption.push_str(BOT_PROMO);
    caption.push_str("\n\n");
    caption.push_str(channel_tag);
    caption
}

//! User-facing texts and shared keyboards
//!
//! The community speaks Russian, the bot does too. Messages are sent with
//! HTML parse mode.

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, WebAppInfo};

use crate::core::config;

pub const WELCOME_TEXT: &str = "🩺 <b>Как пользоваться чатом по терапии</b>\n\
    Добро пожаловать!\n\
    Вы находитесь в профессиональном чате для врачей и ординаторов терапевтических специальностей. \
    Здесь можно задавать вопросы, делиться опытом и получать полезные материалы.\n\n\
    Чат разделён на вкладки:\n\
    ● 📌 <b>ВАЖНОЕ, АНОНСЫ</b> — объявления о прямых эфирах, расписание, новости.\n\
    ● 💬 <b>Общение</b> — свободное общение с коллегами, обсуждения.\n\
    ● 🤝 <b>Прошу совета у коллег</b> — задавайте вопросы экспертам и другим участникам сообщества.\n\
    ● 📚 <b>Эфиры и материалы</b> — записи трансляций, памятки, гайды и другие полезные материалы.\n\n\
    🔧 По техническим вопросам: @reclin2022";

pub const STARTER_PACK_TEXT: &str = "🎁 <b>Хотим сразу поделиться с тобой стартовым набором полезных материалов:</b>\n\
    📌 Памятка «под стекло» по артериальной гипертензии — <a href='https://disk.yandex.ru/d/aCHhf7g7i_KHgw'>Скачать</a>\n\
    📌 Памятки «под стекло» по диарее и запору — <a href='https://disk.yandex.ru/d/Qf_sd_zUepxUPw'>Скачать</a>\n\
    📌 Шаблоны осмотров при НАЖБП и гастрите — <a href='https://disk.yandex.ru/d/0cGXx48hKweI8A'>Скачать</a>\n\
    📌 Гайд: как оформить лист нетрудоспособности — <a href='https://disk.yandex.ru/d/0cGXx48hKweI8A'>Скачать</a>\n\
    📌 Таблица с лекарственными препаратами по клинреку «Гастрит» — <a href='https://disk.yandex.ru/d/C4drU9y2DZEQuA'>Скачать</a>\n\n\
    💬 Больше полезных материалов тебя ждёт в нашем чате — оставайся с нами!";

pub const KICKED_TEXT: &str = "Вы были исключены из сообщества Терапия|Reclin. \
    Чтобы подключиться повторно к сообществу, заполните данные о вашем ФИО и специализации, \
    нажав на кнопку ниже 👇";

pub const REMINDER_TEXT: &str = "👋 Напоминаем: чтобы остаться в сообществе Терапия|Reclin, \
    заполните, пожалуйста, данные о вашем ФИО и специализации, нажав на кнопку ниже 👇";

pub const BROADCAST_PROMPT: &str = "Пришлите сообщение (с медиа или без) для рассылки.";

pub const BROADCAST_CANCELLED: &str = "Рассылка отменена.";

pub const CONNECT_BUTTON: &str = "Подключиться к чату";

pub const FILL_PROFILE_BUTTON: &str = "Заполнить данные";

pub const BROADCAST_CANCEL_BUTTON: &str = "❌ Отмена";

/// Callback data of the broadcast cancel button
pub const BROADCAST_CANCEL_CALLBACK: &str = "broadcast_cancel";

/// Broadcast completion report for the admin
pub fn broadcast_report(sent: u32, failed: u32) -> String {
    format!(
        "Рассылка завершена.\n✅ Отправлено: {}\n❌ Ошибок: {}",
        sent, failed
    )
}

/// Admin /info summary
pub fn info_report(total: i64, complete: i64, pending_checks: i64) -> String {
    format!(
        "👥 Участников: {}\n✅ Заполнили анкету: {}\n⏳ Без анкеты: {}\n🔔 Ожидающих проверок: {}",
        total,
        complete,
        total - complete,
        pending_checks
    )
}

/// Inline keyboard with a single Web App button opening the registration
/// form for the given user.
pub fn webapp_form_keyboard(telegram_id: i64, label: &str) -> InlineKeyboardMarkup {
    let url = config::webapp::form_url(telegram_id)
        .parse()
        .expect("WEBAPP_URL must be a valid URL");

    InlineKeyboardMarkup::new([[InlineKeyboardButton::web_app(label, WebAppInfo { url })]])
}

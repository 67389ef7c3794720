use crate::configuration::{Context, WebhookConfig};
use crate::core::service_manager::{Error as ServiceManagerError, Service};
use crate::database::UserStore;
use async_trait::async_trait;
use std::net::SocketAddr;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use teloxide::update_listeners::webhooks;
use tracing::{error, info, warn};
use url::Url;

const GREETING: &str = "Hello! To continue, please complete the registration:";
const GREETING_REGISTERED: &str =
    "Welcome back! You are already registered. You can update your details here:";
const FALLBACK_REPLY: &str = "Send /start to open the registration form.";

pub struct TelegramService {
    bot: Bot,
    store: Arc<dyn UserStore>,
    gateway_url: Url,
    webhook_url: Url,
    webhook: WebhookConfig,
}

#[async_trait]
impl Service for TelegramService {
    type Context = Context;
    const NAME: &'static str = "telegram";

    async fn new(context: Context) -> Result<Self, ServiceManagerError> {
        let app_url = context.config.telegram.app_url.trim_end_matches('/');
        let gateway_url = Url::parse(&format!("{}/static/gateway.html", app_url))
            .map_err(|e| ServiceManagerError::new(&format!("Invalid app_url: {}", e)))?;
        let webhook_url = Url::parse(&format!("{}/webhook", app_url))
            .map_err(|e| ServiceManagerError::new(&format!("Invalid app_url: {}", e)))?;

        Ok(Self {
            bot: context.bot.clone(),
            store: context.database.clone(),
            gateway_url,
            webhook_url,
            webhook: context.config.telegram.webhook.clone(),
        })
    }

    async fn run(self) -> Result<(), ServiceManagerError> {
        let Self {
            bot,
            store,
            gateway_url,
            webhook_url,
            webhook,
        } = self;
        let gateway_url = Arc::new(gateway_url);

        let handler = move |bot: Bot, msg: Message| {
            let store = Arc::clone(&store);
            let gateway_url = Arc::clone(&gateway_url);
            async move {
                tokio::spawn(async move {
                    let chat_id = msg.chat.id;
                    if let Err(e) = Self::handle_message(bot, msg, store, gateway_url).await {
                        error!(chat_id = chat_id.0, error = %e, "Failed to answer message");
                    }
                });
                respond(())
            }
        };

        if webhook.enabled {
            let address = SocketAddr::from(([0, 0, 0, 0], webhook.port));
            let listener =
                webhooks::axum(bot.clone(), webhooks::Options::new(address, webhook_url.clone()))
                    .await
                    .map_err(|e| ServiceManagerError::new(&format!("Failed to set webhook: {}", e)))?;
            info!(url = %webhook_url, port = webhook.port, "Telegram bot receiving updates via webhook");
            teloxide::repl_with_listener(bot, handler, listener).await;
        } else {
            info!("Telegram bot receiving updates via long polling");
            teloxide::repl(bot, handler).await;
        }
        Ok(())
    }
}

impl TelegramService {
    async fn handle_message(
        bot: Bot,
        msg: Message,
        store: Arc<dyn UserStore>,
        gateway_url: Arc<Url>,
    ) -> ResponseResult<()> {
        let chat_id = msg.chat.id;
        match msg.text() {
            Some(text) if is_start_command(text) => {
                let registered = match store.get_user(chat_id.0).await {
                    Ok(user) => user.is_some(),
                    Err(e) => {
                        warn!(chat_id = chat_id.0, error = %e, "Could not look up registration");
                        false
                    }
                };
                let (greeting, keyboard) = start_reply(&gateway_url, chat_id.0, registered);
                bot.send_message(chat_id, greeting)
                    .reply_markup(keyboard)
                    .await?;
            }
            _ => {
                bot.send_message(chat_id, FALLBACK_REPLY).await?;
            }
        }
        Ok(())
    }
}

fn is_start_command(text: &str) -> bool {
    match text.split_whitespace().next() {
        Some(command) => command == "/start" || command.starts_with("/start@"),
        None => false,
    }
}

fn registration_url(gateway_url: &Url, chat_id: i64) -> Url {
    let mut url = gateway_url.clone();
    url.query_pairs_mut()
        .append_pair("tg_id", &chat_id.to_string());
    url
}

fn start_reply(
    gateway_url: &Url,
    chat_id: i64,
    registered: bool,
) -> (&'static str, InlineKeyboardMarkup) {
    let (greeting, label) = if registered {
        (GREETING_REGISTERED, "Update registration")
    } else {
        (GREETING, "Register")
    };
    let button = InlineKeyboardButton::url(label, registration_url(gateway_url, chat_id));
    (greeting, InlineKeyboardMarkup::new([[button]]))
}

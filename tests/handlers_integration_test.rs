//! Integration tests for Telegram handlers
//!
//! Updates go through the production schema; the Bot API is a wiremock
//! server and the ledger is a temporary SQLite file.
//! Run with: cargo test --test handlers_integration_test

mod common;

use common::{callback_update, photo_update, text_update, TestEnvironment, TestUser, ADMIN_CHAT_ID, ADMIN_USER_ID};
use meowpay::storage::ledger::keys;
use meowpay::storage::{db, get_connection, UserRecord};
use pretty_assertions::assert_eq;
use serial_test::serial;

const CUSTOMER: TestUser = TestUser::new(4242, "Mya", Some("mya_cat"));
const ADMIN: TestUser = TestUser::new(ADMIN_USER_ID, "Boss", Some("boss"));

async fn register(env: &TestEnvironment, user: &TestUser) {
    let record = UserRecord::new(user.id, user.username.map(str::to_string), user.first_name);
    env.ledger.save_new_user(&record).await.unwrap();
}

// ============================================================================
// /start, /save, /balance, /help
// ============================================================================

#[tokio::test]
#[serial]
async fn test_start_registers_user_and_shows_menu() {
    let env = TestEnvironment::new().await;

    env.dispatch(text_update(&CUSTOMER, "/start")).await;

    let user = env.ledger.get_user(CUSTOMER.id).await.unwrap().expect("user saved");
    assert_eq!(user.coin_balance, 0);
    assert_eq!(user.username.as_deref(), Some("mya_cat"));

    let sent = env.mock.calls_to("sendMessage").await;
    let menu = sent
        .iter()
        .find(|call| call.chat_id() == Some(CUSTOMER.id))
        .expect("menu sent to user");
    assert!(menu.text().contains("Mya"));
    assert!(menu.text().contains("Your Coin balance: <b>0</b>"));
    assert_eq!(menu.body["parse_mode"], "HTML");
    let keyboard = menu.body["reply_markup"]["inline_keyboard"].to_string();
    for token in ["premium_prices", "star_prices", "coin_prices", "pay_kpay", "pay_wave"] {
        assert!(keyboard.contains(token), "keyboard is missing {}", token);
    }

    let calls = env
        .mock
        .wait_for(|calls| calls.iter().any(|c| c.chat_id() == Some(ADMIN_CHAT_ID)))
        .await;
    let notice = calls
        .iter()
        .find(|c| c.method == "sendmessage" && c.chat_id() == Some(ADMIN_CHAT_ID))
        .expect("admin told about new user");
    assert!(notice.text().contains("New user: Mya (@mya_cat, id 4242)"));
}

#[tokio::test]
#[serial]
async fn test_start_for_existing_user_shows_balance_without_admin_notice() {
    let env = TestEnvironment::new().await;
    register(&env, &CUSTOMER).await;
    env.ledger.adjust_balance(CUSTOMER.id, 350).await.unwrap();

    env.dispatch(text_update(&CUSTOMER, "/start")).await;
    env.dispatch(text_update(&CUSTOMER, "/start@meow_bot")).await;

    let sent = env.mock.calls_to("sendMessage").await;
    assert_eq!(sent.len(), 2);
    assert!(sent.iter().all(|c| c.chat_id() == Some(CUSTOMER.id)));
    assert!(sent[0].text().contains("<b>350</b>"));
}

#[tokio::test]
#[serial]
async fn test_save_stores_note_text() {
    let env = TestEnvironment::new().await;

    env.dispatch(text_update(&CUSTOMER, "/save order #77 paid 5000")).await;
    env.dispatch(text_update(&CUSTOMER, "/save@meow_bot second note")).await;

    let replies: Vec<String> = env
        .mock
        .calls_to("sendMessage")
        .await
        .into_iter()
        .filter(|c| c.chat_id() == Some(CUSTOMER.id))
        .map(|c| c.text().to_string())
        .collect();
    assert_eq!(replies, vec!["✅ Saved successfully!", "✅ Saved successfully!"]);

    let conn = get_connection(&env.pool).unwrap();
    assert_eq!(db::get_notes(&conn, CUSTOMER.id).unwrap(), vec!["order #77 paid 5000", "second note"]);
    assert_eq!(db::count_users(&conn).unwrap(), 1);
    assert_eq!(env.ledger.get_balance(CUSTOMER.id).await, 0);
}

#[tokio::test]
#[serial]
async fn test_save_without_text_shows_usage() {
    let env = TestEnvironment::new().await;

    env.dispatch(text_update(&CUSTOMER, "/save")).await;
    env.dispatch(text_update(&CUSTOMER, "/save   ")).await;

    let sent = env.mock.calls_to("sendMessage").await;
    assert_eq!(sent.len(), 2);
    assert!(sent.iter().all(|c| c.text() == "Usage: /save something"));

    let conn = get_connection(&env.pool).unwrap();
    assert!(db::get_notes(&conn, CUSTOMER.id).unwrap().is_empty());
    assert_eq!(db::count_users(&conn).unwrap(), 0);
}

#[tokio::test]
#[serial]
async fn test_balance_for_unknown_and_known_user() {
    let env = TestEnvironment::new().await;

    env.dispatch(text_update(&CUSTOMER, "/balance")).await;
    register(&env, &CUSTOMER).await;
    env.ledger.adjust_balance(CUSTOMER.id, 500).await.unwrap();
    env.dispatch(text_update(&CUSTOMER, "/balance")).await;

    let sent = env.mock.calls_to("sendMessage").await;
    assert!(sent[0].text().contains("not registered"));
    assert_eq!(sent[1].text(), "🪙 Your Coin balance: 500");
}

#[tokio::test]
#[serial]
async fn test_help_lists_commands() {
    let env = TestEnvironment::new().await;

    env.dispatch(text_update(&CUSTOMER, "/help")).await;

    let sent = env.mock.calls_to("sendMessage").await;
    assert!(sent[0].text().contains("/balance"));
    assert!(sent[0].text().contains("/addcoin"));
}

#[tokio::test]
#[serial]
async fn test_free_text_and_unknown_commands_are_not_understood() {
    let env = TestEnvironment::new().await;

    env.dispatch(text_update(&CUSTOMER, "I want premium")).await;
    env.dispatch(text_update(&CUSTOMER, "/refund")).await;

    let sent = env.mock.calls_to("sendMessage").await;
    assert_eq!(sent.len(), 2);
    assert!(sent.iter().all(|c| c.text().contains("didn't understand")));
}

// ============================================================================
// Inline menu callbacks
// ============================================================================

#[tokio::test]
#[serial]
async fn test_price_buttons_edit_the_menu_message() {
    let env = TestEnvironment::new().await;

    env.dispatch(callback_update(&CUSTOMER, "premium_prices")).await;
    env.dispatch(callback_update(&CUSTOMER, "star_prices")).await;
    env.dispatch(callback_update(&CUSTOMER, "coin_prices")).await;

    assert_eq!(env.mock.calls_to("answerCallbackQuery").await.len(), 3);
    let edits = env.mock.calls_to("editMessageText").await;
    assert_eq!(edits.len(), 3);
    assert_eq!(edits[0].body["message_id"], 42);
    assert!(edits[0].text().contains("Telegram Premium"));
    assert!(edits[1].text().contains("Telegram Stars"));
    assert!(edits[2].text().contains("Coins"));
    assert!(edits[0].body["reply_markup"].to_string().contains("back_to_main"));
}

#[tokio::test]
#[serial]
async fn test_payment_button_without_phone_shows_unknown() {
    let env = TestEnvironment::new().await;

    env.dispatch(callback_update(&CUSTOMER, "pay_kpay")).await;

    let edits = env.mock.calls_to("editMessageText").await;
    assert!(edits[0].text().contains("Pay with KPay"));
    assert!(edits[0].text().contains("<code>Unknown</code>"));
}

#[tokio::test]
#[serial]
async fn test_payment_button_shows_stored_phone() {
    let env = TestEnvironment::new().await;
    env.ledger.set_setting(keys::WAVE_PHONE, "09 777 888 999").await.unwrap();

    env.dispatch(callback_update(&CUSTOMER, "pay_wave")).await;

    let edits = env.mock.calls_to("editMessageText").await;
    assert!(edits[0].text().contains("Pay with Wave"));
    assert!(edits[0].text().contains("09 777 888 999"));
}

#[tokio::test]
#[serial]
async fn test_back_button_sends_main_menu() {
    let env = TestEnvironment::new().await;

    env.dispatch(callback_update(&CUSTOMER, "back_to_main")).await;

    let sent = env.mock.calls_to("sendMessage").await;
    let menu = sent
        .iter()
        .find(|c| c.chat_id() == Some(CUSTOMER.id))
        .expect("main menu sent");
    assert!(menu.text().contains("Welcome to the Meow Premium shop"));
    assert!(env.ledger.get_user(CUSTOMER.id).await.unwrap().is_some());
}

#[tokio::test]
#[serial]
async fn test_unknown_button_is_answered_with_notice() {
    let env = TestEnvironment::new().await;

    env.dispatch(callback_update(&CUSTOMER, "refund_everything")).await;

    let answers = env.mock.calls_to("answerCallbackQuery").await;
    assert_eq!(answers.len(), 1);
    assert!(answers[0].text().contains("no longer supported"));
    assert!(env.mock.calls_to("editMessageText").await.is_empty());
}

// ============================================================================
// Payment screenshots
// ============================================================================

#[tokio::test]
#[serial]
async fn test_photo_is_forwarded_to_admin_and_acknowledged() {
    let env = TestEnvironment::new().await;

    env.dispatch(photo_update(&CUSTOMER, Some("KPay 5000 for 550 coins"))).await;

    let forwards = env.mock.calls_to("forwardMessage").await;
    assert_eq!(forwards.len(), 1);
    assert_eq!(forwards[0].chat_id(), Some(ADMIN_CHAT_ID));
    assert_eq!(forwards[0].body["from_chat_id"], CUSTOMER.id);
    assert_eq!(forwards[0].body["message_id"], 11);

    let sent = env.mock.calls_to("sendMessage").await;
    let caption = sent
        .iter()
        .find(|c| c.chat_id() == Some(ADMIN_CHAT_ID))
        .expect("caption sent to admin");
    assert!(caption.text().contains("Mya (@mya_cat, id 4242)"));
    assert!(caption.text().contains("/addcoin 4242"));
    assert!(caption.text().contains("Note: KPay 5000 for 550 coins"));

    let ack = sent
        .iter()
        .find(|c| c.chat_id() == Some(CUSTOMER.id))
        .expect("user acknowledged");
    assert!(ack.text().contains("Screenshot received"));
}

// ============================================================================
// Admin commands
// ============================================================================

#[tokio::test]
#[serial]
async fn test_admin_sets_payment_phones() {
    let env = TestEnvironment::new().await;

    env.dispatch(text_update(&ADMIN, "/setkpay 09123456789")).await;
    env.dispatch(text_update(&ADMIN, "/setwave +95 9 111 222 333")).await;
    env.dispatch(text_update(&ADMIN, "/setkpay 09987654321")).await;

    assert_eq!(
        env.ledger.get_setting(keys::KPAY_PHONE).await.as_deref(),
        Some("09987654321")
    );
    assert_eq!(
        env.ledger.get_setting(keys::WAVE_PHONE).await.as_deref(),
        Some("+95 9 111 222 333")
    );
    let sent = env.mock.calls_to("sendMessage").await;
    assert_eq!(sent[0].text(), "✅ KPay phone set to 09123456789");
}

#[tokio::test]
#[serial]
async fn test_non_admin_cannot_set_phone() {
    let env = TestEnvironment::new().await;

    env.dispatch(text_update(&CUSTOMER, "/setkpay 09123456789")).await;

    assert_eq!(env.ledger.get_setting(keys::KPAY_PHONE).await, None);
    let sent = env.mock.calls_to("sendMessage").await;
    assert!(sent[0].text().contains("admins only"));
}

#[tokio::test]
#[serial]
async fn test_setkpay_rejects_missing_or_invalid_phone() {
    let env = TestEnvironment::new().await;

    env.dispatch(text_update(&ADMIN, "/setkpay")).await;
    env.dispatch(text_update(&ADMIN, "/setkpay call me maybe")).await;

    assert_eq!(env.ledger.get_setting(keys::KPAY_PHONE).await, None);
    let sent = env.mock.calls_to("sendMessage").await;
    assert_eq!(sent[0].text(), "Usage: /setkpay <phone>");
    assert!(sent[1].text().contains("does not look like a phone number"));
}

#[tokio::test]
#[serial]
async fn test_addcoin_tops_up_and_notifies_user() {
    let env = TestEnvironment::new().await;
    register(&env, &CUSTOMER).await;

    env.dispatch(text_update(&ADMIN, "/addcoin 4242 550")).await;

    assert_eq!(env.ledger.get_balance(CUSTOMER.id).await, 550);
    let sent = env.mock.calls_to("sendMessage").await;
    let notice = sent
        .iter()
        .find(|c| c.chat_id() == Some(CUSTOMER.id))
        .expect("user notified");
    assert!(notice.text().contains("550 Coins were added"));
    let reply = sent
        .iter()
        .find(|c| c.chat_id() == Some(ADMIN.id))
        .expect("admin reply");
    assert_eq!(reply.text(), "✅ User 4242 balance: 550 (+550)");
}

#[tokio::test]
#[serial]
async fn test_addcoin_never_drives_balance_negative() {
    let env = TestEnvironment::new().await;
    register(&env, &CUSTOMER).await;
    env.ledger.adjust_balance(CUSTOMER.id, 100).await.unwrap();

    env.dispatch(text_update(&ADMIN, "/addcoin 4242 -101")).await;

    assert_eq!(env.ledger.get_balance(CUSTOMER.id).await, 100);
    let sent = env.mock.calls_to("sendMessage").await;
    assert_eq!(sent.len(), 1);
    assert!(sent[0].text().contains("has only 100 Coins"));
}

#[tokio::test]
#[serial]
async fn test_addcoin_for_unknown_user_and_bad_arguments() {
    let env = TestEnvironment::new().await;

    env.dispatch(text_update(&ADMIN, "/addcoin 1 10")).await;
    env.dispatch(text_update(&ADMIN, "/addcoin 1")).await;
    env.dispatch(text_update(&CUSTOMER, "/addcoin 4242 1000000")).await;

    let sent = env.mock.calls_to("sendMessage").await;
    assert_eq!(sent[0].text(), "❌ User 1 is not registered.");
    assert_eq!(sent[1].text(), "Usage: /addcoin <user_id> <amount>");
    assert!(sent[2].text().contains("admins only"));
    assert_eq!(env.ledger.get_balance(CUSTOMER.id).await, 0);
}

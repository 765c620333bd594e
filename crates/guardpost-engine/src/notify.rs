use guardpost_mailer::{compose_account_email, MailerHandle};
use guardpost_store::{collections, models::GuardAccount, Document, DocumentEvent};
use tracing::{error, info, warn};

/// Handles the account-created feed: emails credentials to newly
/// provisioned security guards.
///
/// Nothing here is ever fatal — the account already exists by the time this
/// runs, so a missing email, a disabled mailer or a failed send is logged
/// and dropped, never raised.
pub struct AccountNotifier {
    mail: MailerHandle,
}

impl AccountNotifier {
    pub fn new(mail: MailerHandle) -> Self {
        Self { mail }
    }

    pub async fn handle_created(&self, event: &DocumentEvent) {
        if event.collection != collections::ACCOUNTS {
            return;
        }

        let doc = Document::new(event.id.clone(), event.data.clone());
        let account = match GuardAccount::parse(&doc) {
            Ok(a) => a,
            Err(e) => {
                warn!(account = %event.id, "account created with undeserializable data: {e}");
                return;
            }
        };
        if !account.role.eq_ignore_ascii_case("security") {
            return;
        }

        let Some(email) = account.email.as_deref().filter(|e| !e.is_empty()) else {
            warn!(
                account = %event.id,
                "security guard account created without email; cannot send notification"
            );
            return;
        };

        let MailerHandle::Enabled { from, transport } = &self.mail else {
            error!(
                account = %event.id,
                "mail transporter not configured — skipping guard account email"
            );
            return;
        };

        let message = compose_account_email(&account, &event.id, from, email);
        match transport.send(&message).await {
            Ok(()) => info!(account = %event.id, email, "sent security guard account email"),
            Err(e) => error!(
                account = %event.id,
                email,
                "failed to send security guard account email: {e}"
            ),
        }
    }
}

use guardpost_store::models::GuardAccount;

use crate::mailer::OutgoingEmail;

const SUBJECT: &str = "Security Guard Account Created";

/// Build the account-created notification for a newly provisioned guard.
///
/// Every field the account record omits gets a reader-facing default so the
/// email never shows holes; `account_id` backs up a missing `guard_id`.
pub fn compose_account_email(
    account: &GuardAccount,
    account_id: &str,
    from: &str,
    to: &str,
) -> OutgoingEmail {
    let display_name = account.display_name();
    let guard_id = if account.guard_id.is_empty() {
        account_id.to_string()
    } else {
        account.guard_id.clone()
    };
    let position = account.position.as_deref().unwrap_or("Security Guard");
    let contact = account.contact.as_deref().unwrap_or("Not specified");
    let address = account.address.as_deref().unwrap_or("Not specified");
    let sex = account.sex.as_deref().unwrap_or("Not specified");
    let account_status = account.account_status.as_deref().unwrap_or("Active");
    let status = account.status.as_deref().unwrap_or("Off Duty");
    let initial_password = account
        .initial_password
        .as_deref()
        .unwrap_or("Provided separately");

    let rows: Vec<(&str, &str)> = vec![
        ("Name", display_name.as_str()),
        ("Email", to),
        ("Temporary Password", initial_password),
        ("Guard ID", guard_id.as_str()),
        ("Position", position),
        ("Contact Number", contact),
        ("Address", address),
        ("Sex", sex),
        ("Account Status", account_status),
        ("Current Duty Status", status),
    ];

    let mut text_lines = vec![
        format!("Dear {display_name},"),
        String::new(),
        "Your security guard account has been created. Please review the information \
         below and keep it for your records."
            .to_string(),
        String::new(),
    ];
    for (label, value) in &rows {
        text_lines.push(format!("{label}: {value}"));
    }
    text_lines.extend([
        String::new(),
        "For security purposes, change your password after your first login and do \
         not share these credentials."
            .to_string(),
        String::new(),
        "Regards,".to_string(),
        "Security Command Center".to_string(),
    ]);

    let table_rows: String = rows
        .iter()
        .map(|(label, value)| {
            format!(
                "<tr>\
                 <td style=\"padding:6px 12px; border:1px solid #d0d7de; font-weight:600;\">{label}</td>\
                 <td style=\"padding:6px 12px; border:1px solid #d0d7de;\">{value}</td>\
                 </tr>"
            )
        })
        .collect();

    let html = format!(
        "<div style=\"font-family: Arial, sans-serif; color:#1a1a1a; background:#f7f9fc; padding:24px;\">\
         <p>Dear {display_name},</p>\
         <p>Your security guard account has been created. Please review the information \
         below and keep it for your records.</p>\
         <table style=\"border-collapse:collapse; width:100%; max-width:520px;\"><tbody>{table_rows}</tbody></table>\
         <p style=\"margin-top:18px;\">For security purposes, change your password after \
         your first login and do not share these credentials.</p>\
         <p style=\"margin-top:24px;\">Regards,<br/>Security Command Center</p>\
         </div>"
    );

    OutgoingEmail {
        from: from.to_string(),
        to: to.to_string(),
        subject: SUBJECT.to_string(),
        text: text_lines.join("\n"),
        html,
    }
}

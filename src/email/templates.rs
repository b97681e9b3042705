/// Email template functions
///
/// Each function builds the (subject, plaintext body) pair for one
/// lifecycle event. Callers enqueue the result in the email outbox rather
/// than sending directly, so these stay pure and easy to test.
use chrono::NaiveDateTime;

fn signature() -> String {
    let site = crate::app_config::site();
    format!("The {} Team", site.name)
}

fn date_line(when: Option<NaiveDateTime>) -> String {
    match when {
        Some(ts) => ts.format("%B %d, %Y").to_string(),
        None => "Recently".to_string(),
    }
}

/// Thank-you email to the donor once their item has been handed on.
pub fn thank_you_email(
    donor_name: &str,
    item_title: &str,
    category_name: &str,
    donated_at: Option<NaiveDateTime>,
) -> (String, String) {
    let site = crate::app_config::site();
    let subject = format!("Thank you for your donation: {}", item_title);

    let body = format!(
        r#"Dear {donor},

Thank you for your generous donation of "{title}" to {site_name}!

Your donated item has been passed on to someone who needs it.

Item details:
- Title: {title}
- Category: {category}
- Donated on: {donated_on}

With appreciation,
{signature}

---
This is an automated message. Please do not reply to this email.
"#,
        donor = donor_name,
        title = item_title,
        site_name = site.name,
        category = category_name,
        donated_on = date_line(donated_at),
        signature = signature(),
    );

    (subject, body)
}

/// Match notification to the donor.
pub fn match_donor_email(
    donor_name: &str,
    item_title: &str,
    category_name: &str,
    matched_at: NaiveDateTime,
) -> (String, String) {
    let subject = format!("Your donation has been matched: {}", item_title);

    let body = format!(
        r#"Dear {donor},

Good news! Your donation of "{title}" has been matched with someone who
requested it.

Donation details:
- Item: {title}
- Category: {category}
- Matched on: {matched_on}

Best regards,
{signature}
"#,
        donor = donor_name,
        title = item_title,
        category = category_name,
        matched_on = date_line(Some(matched_at)),
        signature = signature(),
    );

    (subject, body)
}

/// Fulfilment notification to the requester.
pub fn match_requester_email(
    requester_name: &str,
    request_title: &str,
    category_name: &str,
    matched_at: NaiveDateTime,
) -> (String, String) {
    let subject = format!("Your request has been fulfilled: {}", request_title);

    let body = format!(
        r#"Dear {requester},

We found a match for your request: "{title}"

A community member has donated an item that covers your request. Our team
will be in touch about pickup or delivery arrangements.

Request details:
- Item: {title}
- Category: {category}
- Matched on: {matched_on}

Best regards,
{signature}
"#,
        requester = requester_name,
        title = request_title,
        category = category_name,
        matched_on = date_line(Some(matched_at)),
        signature = signature(),
    );

    (subject, body)
}

/// Alert to an administrator about a newly submitted donation.
pub fn admin_alert_email(
    donor_name: &str,
    item_title: &str,
    category_name: &str,
) -> (String, String) {
    let site = crate::app_config::site();
    let subject = format!("{} Admin: new donation awaiting review", site.name);

    let body = format!(
        r#"A new donation has been submitted and is waiting for review.

- Item: {title}
- Category: {category}
- Donor: {donor}

Review it from the admin dashboard: {base_url}/admin
"#,
        title = item_title,
        category = category_name,
        donor = donor_name,
        base_url = site.base_url,
    );

    (subject, body)
}

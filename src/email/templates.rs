pub fn render_password_reset(reset_url: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"></head>
<body style="font-family: sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
    <h2>Reset your Dreamvault password</h2>
    <p>Someone asked to reset the password for your dream journal.</p>
    <p><a href="{reset_url}" style="display: inline-block; padding: 10px 20px; background: #6d28d9; color: white; text-decoration: none; border-radius: 4px;">Choose a new password</a></p>
    <p style="color: #666; font-size: 14px;">The link works once and expires in 1 hour. Using it signs you out everywhere and cancels any other reset links. If you didn't ask for this, ignore this email.</p>
</body>
</html>"#
    )
}

pub fn render_password_changed(name: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"></head>
<body style="font-family: sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
    <h2>Your password was changed</h2>
    <p>Hi {name},</p>
    <p>The password for your Dreamvault account was just reset and all sessions were signed out.</p>
    <p style="color: #666; font-size: 14px;">If this wasn't you, request a new reset link right away.</p>
</body>
</html>"#
    )
}

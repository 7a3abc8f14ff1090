use bazaar_core::auth::AuthSession;

use crate::cli::AuthCommands;
use crate::commands::common::AppContext;
use crate::error::CliError;

pub async fn run_auth(command: AuthCommands, ctx: &AppContext) -> Result<(), CliError> {
    let auth = ctx.auth_client();
    match command {
        AuthCommands::Login { identity, password } => {
            let session = auth.auth_with_password(&identity, &password).await?;
            println!(
                "Signed in to {} as {}",
                ctx.client.base_url(),
                session.record.display_name()
            );
            println!("Run `bazaar favorites sync` to upload favorites saved on this device.");
        }
        AuthCommands::Register {
            username,
            email,
            password,
            confirm,
        } => {
            let session = auth.register(&username, &email, &password, &confirm).await?;
            println!("Registered and signed in as {}", session.record.display_name());
        }
        AuthCommands::Status => match ctx.auth.session() {
            Some(session) if session.is_valid() => println!("{}", describe_session(&session)),
            Some(_) => println!("Session expired. Run `bazaar auth login` again."),
            None => println!("Not signed in."),
        },
        AuthCommands::Refresh => {
            let session = auth.refresh().await?;
            println!("{}", describe_session(&session));
        }
        AuthCommands::Logout => {
            auth.logout()?;
            println!("Signed out of {}", ctx.client.base_url());
        }
        AuthCommands::Methods => {
            let providers = auth.list_auth_methods().await?;
            if providers.is_empty() {
                println!("Password sign-in only.");
            } else {
                println!("OAuth2 providers: {}", providers.join(", "));
            }
        }
    }
    Ok(())
}

pub fn describe_session(session: &AuthSession) -> String {
    let email = session.record.email.as_deref().unwrap_or("(no email)");
    match session.expires_at() {
        Some(expires_at) => format!(
            "Signed in as {} <{email}> (expires_at={expires_at})",
            session.record.display_name()
        ),
        None => format!("Signed in as {} <{email}>", session.record.display_name()),
    }
}

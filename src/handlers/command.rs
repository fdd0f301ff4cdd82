use std::sync::Arc;

use axum::extract::State;
use axum::Form;
use tracing::{error, info};

use crate::context::ServerContext;
use crate::dispatch::DispatchJob;
use crate::models::command::{CommandForm, ModifyCommand};
use crate::services::auth_service;

/// `POST /` entry point.
///
/// `command=authenticate` carries credentials; every other command carries
/// a session token and is dispatched on its text.
pub async fn handle_post(
    State(ctx): State<Arc<ServerContext>>,
    Form(form): Form<CommandForm>,
) -> String {
    if form.command == "authenticate" {
        handle_authentication(&ctx, &form)
    } else {
        handle_command(&ctx, &form).await
    }
}

/// Register a new session and answer with its token.
///
/// The client contract is textual: the token is the suffix after the last
/// colon of the response. Bad credentials still create a session, just an
/// unauthorized one.
fn handle_authentication(ctx: &ServerContext, form: &CommandForm) -> String {
    let username = form.username.as_deref().unwrap_or_default();
    let password = form.password.as_deref().unwrap_or_default();

    let token = auth_service::generate_token();
    let authorized = auth_service::check_credentials(&ctx.config, username, password);
    ctx.registry.add_user(username, &token, authorized);

    if authorized {
        ctx.activity_log
            .record("New authorized client", Some(username));
        format!("Authorized client,username:{token}")
    } else {
        ctx.activity_log
            .record("New unauthorized client", Some(username));
        format!("Unauthorized client,username:{token}")
    }
}

async fn handle_command(ctx: &ServerContext, form: &CommandForm) -> String {
    let token = form.token.as_deref().unwrap_or_default();
    let message = form.command.as_str();

    let username = ctx.registry.user_from_token(token);
    if let Some(username) = &username {
        info!("The client {username} sent: {message}");
    }

    match message {
        "end" => handle_end(ctx, token, username.as_deref()),
        "image" => handle_image(ctx, token, username.as_deref()),
        other => match ModifyCommand::parse(other) {
            Some(modify) => handle_modify(ctx, token, username.as_deref(), modify).await,
            None => "Unknown command".to_string(),
        },
    }
}

fn handle_end(ctx: &ServerContext, token: &str, username: Option<&str>) -> String {
    match username {
        Some(username) => {
            ctx.activity_log
                .record("Finished the execution of the client ", Some(username));
            ctx.registry.remove_user(token);
            "End".to_string()
        }
        None => "Loading image. Try again later".to_string(),
    }
}

fn handle_image(ctx: &ServerContext, token: &str, username: Option<&str>) -> String {
    if !ctx.artifact.is_ready() {
        return "Loading image. Try again later".to_string();
    }

    let Some(socket) = ctx.registry.socket_from_token(token) else {
        return "No active connection found for user".to_string();
    };

    let job = DispatchJob {
        socket,
        token: token.to_string(),
    };
    if ctx.dispatch.send(job).is_err() {
        // Only possible when the worker is gone, i.e. during shutdown.
        error!("dispatch queue is closed, dropping image request");
        return "error,try again".to_string();
    }

    if let Some(username) = username {
        ctx.activity_log
            .record("Image request made by the client ", Some(username));
    }
    "Sending image...".to_string()
}

async fn handle_modify(
    ctx: &ServerContext,
    token: &str,
    username: Option<&str>,
    modify: ModifyCommand,
) -> String {
    if ctx.registry.is_authorized(token) != Some(true) {
        return "You don't have permission to modify".to_string();
    }

    match ctx.supplies.modify_supplies(&modify.field, modify.amount).await {
        Ok(true) => {
            if let Some(username) = username {
                ctx.activity_log
                    .record("Modification made by the client ", Some(username));
            }
            "Modified".to_string()
        }
        Ok(false) => "error,try again".to_string(),
        Err(e) => {
            error!("failed to modify supplies: {e}");
            "error,try again".to_string()
        }
    }
}

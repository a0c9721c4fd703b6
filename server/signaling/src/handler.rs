use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::{info, warn};
use vox_metrics::{CallMetrics, ConnMetrics};
use vox_wire::{ClientEvent, RelayControl, ServerEvent, TranscriberControl};

use crate::config::Config;
use crate::errors::SignalingError;
use crate::fanout::FanoutLink;
use crate::state::{CallRecord, SignalingState};

pub struct Services {
    pub state: Arc<SignalingState>,
    pub relay: Arc<FanoutLink>,
    pub transcriber: Arc<FanoutLink>,
    pub conn_metrics: Arc<ConnMetrics>,
    pub call_metrics: Arc<CallMetrics>,
    pub cfg: Arc<Config>,
}

pub async fn handle_connection<S>(stream: S, services: Arc<Services>)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    services.conn_metrics.accepted();

    let ws = match tokio_tungstenite::accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!("websocket handshake failed: {e}");
            return;
        }
    };

    let (mut sink, mut stream) = ws.split();
    let (tx, mut rx) = mpsc::channel::<ServerEvent>(64);

    let writer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let Ok(text) = serde_json::to_string(&event) else { continue };
            if sink.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    let mut registered_username: Option<String> = None;

    while let Some(msg) = stream.next().await {
        let msg = match msg {
            Ok(m) => m,
            Err(_) => break,
        };
        let text = match msg {
            Message::Text(t) => t,
            Message::Close(_) => break,
            _ => continue,
        };

        let event: ClientEvent = match serde_json::from_str(&text) {
            Ok(e) => e,
            Err(e) => {
                warn!("unparseable client event: {e}");
                continue;
            }
        };

        handle_event(event, &tx, &mut registered_username, &services).await;
    }

    if let Some(username) = registered_username {
        logout(&username, &services).await;
    }

    drop(tx);
    let _ = writer.await;
    services.conn_metrics.closed();
}

async fn handle_event(
    event: ClientEvent,
    tx: &mpsc::Sender<ServerEvent>,
    registered_username: &mut Option<String>,
    services: &Services,
) {
    match event {
        ClientEvent::Register { group, username } => {
            services.conn_metrics.msg_rx("register");
            let (group, username) = match validate_register(group, username) {
                Ok(fields) => fields,
                Err(e) => {
                    let _ = tx.try_send(ServerEvent::error(e.to_string()));
                    return;
                }
            };
            match services.state.register(group, &username, tx.clone()).await {
                Ok(()) => {
                    *registered_username = Some(username.clone());
                    services.call_metrics.registered(group.as_str());
                    let _ = tx.try_send(ServerEvent::SetCookie { session_id: format!("{}_{}", group.as_str(), username) });
                    services.state.broadcast(services.state.user_status().await).await;
                }
                Err(e) => {
                    let _ = tx.try_send(ServerEvent::error(e.to_string()));
                }
            }
        }

        ClientEvent::CallUser { call_id, to_user, from_group, from_user } => {
            services.conn_metrics.msg_rx("call_user");
            let (call_id, to_user, from_group, from_user) = match validate_call_user(call_id, to_user, from_group, from_user) {
                Ok(fields) => fields,
                Err(e) => {
                    let _ = tx.try_send(ServerEvent::error(e.to_string()));
                    return;
                }
            };
            let to_group = from_group.opposite();
            let callee_cohort = services.state.user_cohort(&to_user).await;
            if callee_cohort != Some(to_group) {
                let _ = tx.try_send(ServerEvent::error(SignalingError::UserNotFound.to_string()));
                return;
            }
            if services.cfg.reject_second_call && !services.state.calls_for_user(&to_user).await.is_empty() {
                let _ = tx.try_send(ServerEvent::error(SignalingError::UserBusy.to_string()));
                return;
            }
            let record = CallRecord { caller: from_user.clone(), callee: to_user.clone(), caller_group: from_group, callee_group: to_group };
            match services.state.create_call(&call_id, record).await {
                Ok(()) => {
                    services.state.send_to(&to_user, ServerEvent::IncomingCall { call_id, from_user }).await;
                }
                Err(e) => {
                    let _ = tx.try_send(ServerEvent::error(e.to_string()));
                }
            }
        }

        ClientEvent::AcceptCall { call_id, language } => {
            services.conn_metrics.msg_rx("accept_call");
            let Some(call_id) = call_id.filter(|c| !c.trim().is_empty()) else {
                let _ = tx.try_send(ServerEvent::error(SignalingError::MissingCallId.to_string()));
                return;
            };
            let Some(record) = services.state.call(&call_id).await else {
                let _ = tx.try_send(ServerEvent::error(SignalingError::CallNotFound.to_string()));
                return;
            };
            services.call_metrics.call_started();
            services
                .state
                .send_to(
                    &record.caller,
                    ServerEvent::CallAccepted {
                        call_id: call_id.clone(),
                        from_user: record.caller.clone(),
                        to_user: record.callee.clone(),
                        caller_group: record.caller_group,
                        callee_group: record.callee_group,
                        language: language.clone(),
                    },
                )
                .await;

            services
                .relay
                .notify(&RelayControl::CallAccepted {
                    call_id: call_id.clone(),
                    from_user: record.caller.clone(),
                    to_user: record.callee.clone(),
                    caller_group: record.caller_group,
                    callee_group: record.callee_group,
                })
                .await;
            services
                .transcriber
                .notify(&TranscriberControl::CallAccepted {
                    call_id,
                    from_user: record.caller,
                    to_user: record.callee,
                    caller_group: record.caller_group,
                    callee_group: record.callee_group,
                    caller_language: language.clone(),
                    callee_language: language,
                })
                .await;
        }

        ClientEvent::CallRejected { call_id } => {
            services.conn_metrics.msg_rx("call_rejected");
            let Some(call_id) = call_id.filter(|c| !c.trim().is_empty()) else {
                let _ = tx.try_send(ServerEvent::error(SignalingError::MissingCallId.to_string()));
                return;
            };
            end_call(&call_id, ServerEvent::CallRejected, services).await;
        }

        ClientEvent::HangUp { call_id } => {
            services.conn_metrics.msg_rx("hang_up");
            let Some(call_id) = call_id.filter(|c| !c.trim().is_empty()) else {
                let _ = tx.try_send(ServerEvent::error(SignalingError::MissingCallId.to_string()));
                return;
            };
            end_call(&call_id, ServerEvent::CallEnded, services).await;
        }

        ClientEvent::Logout => {
            services.conn_metrics.msg_rx("logout");
            if let Some(username) = registered_username.take() {
                logout(&username, services).await;
            }
        }

        ClientEvent::Ping { timestamp } => {
            let _ = tx.try_send(ServerEvent::Pong { timestamp });
        }
    }
}

fn validate_register(group: Option<vox_wire::Cohort>, username: Option<String>) -> Result<(vox_wire::Cohort, String), SignalingError> {
    let group = group.ok_or(SignalingError::MissingRegisterFields)?;
    let username = username.filter(|u| !u.trim().is_empty()).ok_or(SignalingError::MissingRegisterFields)?;
    Ok((group, username))
}

fn validate_call_user(
    call_id: Option<String>,
    to_user: Option<String>,
    from_group: Option<vox_wire::Cohort>,
    from_user: Option<String>,
) -> Result<(String, String, vox_wire::Cohort, String), SignalingError> {
    let call_id = call_id.filter(|c| !c.trim().is_empty()).ok_or(SignalingError::MissingCallFields)?;
    let to_user = to_user.filter(|u| !u.trim().is_empty()).ok_or(SignalingError::MissingCallFields)?;
    let from_group = from_group.ok_or(SignalingError::MissingCallFields)?;
    let from_user = from_user.filter(|u| !u.trim().is_empty()).ok_or(SignalingError::MissingCallFields)?;
    Ok((call_id, to_user, from_group, from_user))
}

async fn end_call(call_id: &str, terminal: ServerEvent, services: &Services) {
    if call_id.trim().is_empty() {
        return;
    }
    let Some(record) = services.state.remove_call(call_id).await else {
        return;
    };
    match &terminal {
        ServerEvent::CallEnded => services.call_metrics.call_ended(),
        ServerEvent::CallRejected => services.call_metrics.call_rejected(),
        _ => {}
    }
    services.state.send_to(&record.caller, terminal.clone()).await;
    services.state.send_to(&record.callee, terminal.clone()).await;

    let (relay_event, transcriber_event): (RelayControl, TranscriberControl) = match terminal {
        ServerEvent::CallEnded => (
            RelayControl::CallEnded { call_id: call_id.to_string() },
            TranscriberControl::CallEnded { call_id: call_id.to_string() },
        ),
        _ => (
            RelayControl::CallRejected { call_id: call_id.to_string() },
            TranscriberControl::CallRejected { call_id: call_id.to_string() },
        ),
    };
    services.relay.notify(&relay_event).await;
    services.transcriber.notify(&transcriber_event).await;
}

async fn logout(username: &str, services: &Services) {
    info!(username, "logout");
    services.state.remove_user(username).await;
    for call_id in services.state.calls_for_user(username).await {
        end_call(&call_id, ServerEvent::CallEnded, services).await;
    }
    services.state.broadcast(services.state.user_status().await).await;
    services.relay.notify(&RelayControl::Logout { username: username.to_string() }).await;
    services.transcriber.notify(&TranscriberControl::Logout { username: username.to_string() }).await;
}

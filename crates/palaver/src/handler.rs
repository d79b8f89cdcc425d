//! Per-connection handler: frame loop and command dispatch.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Register the connection as unbound.
//!   2. Loop: receive frames → decode → dispatch Register / LoginByUnPw /
//!      LoginBySession; every other tag takes the `ArgumentInvalid` reject
//!      path and the connection stays open.
//!   3. A successful registration or a confirmed login binds the
//!      connection to its account; further commands on a bound connection
//!      are rejected, the messaging surface lives elsewhere.
//!
//! Frame failures split two ways. A payload that decrypted and parsed but
//! doesn't fit its command tag is the client's mistake: answered with
//! `ArgumentInvalid`, connection kept. Bytes that don't decrypt or parse at
//! all mean the stream is desynced — there is no way to answer reliably, so
//! the connection is dropped.

use std::sync::Arc;

use palaver_protocol::{
    Command, LoginResponse, ProtocolError, RegisterResponse, RequestPayload,
    ResponsePacket, ResponsePayload,
};
use palaver_transport::{Connection, TcpConnection};
use palaver_users::{
    AuthFailure, LoginConfirmer, UserLogKind, login_by_password,
    login_by_session, register,
};
use tokio::sync::watch;

use crate::PalaverError;
use crate::registry::BoundUser;
use crate::server::ServerState;

/// Handles a single connection from accept to close.
///
/// The supervising task removes the connection from the registry after
/// this returns; nothing here does removal.
pub(crate) async fn handle_connection(
    conn: TcpConnection,
    state: Arc<ServerState>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), PalaverError> {
    let conn_id = conn.id();
    let peer = conn.peer_addr();
    tracing::debug!(%conn_id, %peer, "handling new connection");

    state.registry.lock().await.add_unbound(conn_id);

    loop {
        let data = tokio::select! {
            _ = shutdown.changed() => {
                tracing::info!(%conn_id, "closing connection for shutdown");
                let _ = conn.close().await;
                break;
            }
            received = conn.recv() => match received {
                Ok(Some(data)) => data,
                Ok(None) => {
                    tracing::info!(%conn_id, "connection closed cleanly");
                    break;
                }
                Err(e) => {
                    tracing::debug!(%conn_id, error = %e, "recv error");
                    return Err(e.into());
                }
            },
        };

        let packet = match state.wire.decode_request(&data) {
            Ok(packet) => packet,
            Err(ProtocolError::Payload { command, detail }) => {
                tracing::debug!(
                    %conn_id, %command, detail, "malformed request payload"
                );
                send_failure(
                    &conn,
                    &state,
                    command,
                    AuthFailure::ArgumentInvalid,
                )
                .await?;
                continue;
            }
            Err(e) => {
                // Desynced stream; any answer would be garbage too.
                tracing::warn!(
                    %conn_id, error = %e, "undecodable frame, dropping"
                );
                let _ = conn.close().await;
                return Err(e.into());
            }
        };

        // A bound connection has no further commands in this server; the
        // messaging surface lives elsewhere.
        if state.registry.lock().await.bound_user(conn_id).is_some() {
            tracing::debug!(
                %conn_id, command = %packet.command,
                "command on already-bound connection"
            );
            send_failure(
                &conn,
                &state,
                packet.command,
                AuthFailure::ArgumentInvalid,
            )
            .await?;
            continue;
        }

        match packet.payload {
            RequestPayload::Register(req) => {
                // The account is created before the response goes out; a
                // failed send leaves it registered.
                let outcome = {
                    let mut store = state.store.lock().await;
                    register(
                        &mut store,
                        &req.username,
                        &req.password,
                        &req.nickname,
                    )
                };
                match outcome {
                    Ok((user, warning_same_password)) => {
                        let response = ResponsePacket::success(
                            Command::Register,
                            ResponsePayload::Register(RegisterResponse {
                                login_session: user.session.raw().to_string(),
                                warning_same_password,
                                user_guid: user.user_guid,
                            }),
                        );
                        send_response(&conn, &state, &response).await?;
                        state.registry.lock().await.bind(
                            conn_id,
                            BoundUser {
                                user_guid: user.user_guid,
                                username: user.username,
                            },
                        );
                    }
                    Err(failure) => {
                        send_failure(&conn, &state, Command::Register, failure)
                            .await?;
                    }
                }
            }

            RequestPayload::LoginByUnPw(req) => {
                let lookup = {
                    let store = state.store.lock().await;
                    login_by_password(&store, &req.username, &req.password)
                };
                match lookup {
                    Ok(confirmer) => {
                        finish_login(&conn, &state, packet.command, confirmer)
                            .await?;
                    }
                    Err(failure) => {
                        send_failure(&conn, &state, packet.command, failure)
                            .await?;
                    }
                }
            }

            RequestPayload::LoginBySession(req) => {
                let lookup = {
                    let store = state.store.lock().await;
                    login_by_session(&store, &req.session)
                };
                match lookup {
                    Ok(confirmer) => {
                        finish_login(&conn, &state, packet.command, confirmer)
                            .await?;
                    }
                    Err(failure) => {
                        send_failure(&conn, &state, packet.command, failure)
                            .await?;
                    }
                }
            }

            RequestPayload::Unsupported => {
                tracing::debug!(
                    %conn_id, command = %packet.command,
                    "command without a handler"
                );
                send_failure(
                    &conn,
                    &state,
                    packet.command,
                    AuthFailure::ArgumentInvalid,
                )
                .await?;
            }
        }
    }

    Ok(())
}

/// Completes a tentatively accepted login: response first, commit second.
///
/// The success response carries the pending token; only once the send went
/// through is the rotation committed and the connection bound. A failed
/// send cancels instead, so the client's old token stays valid.
async fn finish_login(
    conn: &TcpConnection,
    state: &Arc<ServerState>,
    command: Command,
    mut confirmer: LoginConfirmer,
) -> Result<(), PalaverError> {
    let response = ResponsePacket::success(
        command,
        ResponsePayload::Login(LoginResponse {
            login_session: confirmer.pending_session().raw().to_string(),
            user_guid: confirmer.user().user_guid,
        }),
    );
    let bytes = state.wire.encode_response(&response)?;

    if let Err(e) = conn.send(&bytes).await {
        confirmer.cancel();
        return Err(e.into());
    }

    let user = {
        let mut store = state.store.lock().await;
        let user = confirmer.confirm(&mut store).clone();
        store.append_log(
            user.user_guid,
            UserLogKind::Login,
            format!("Login via {command} from {peer}.", peer = conn.peer_addr()),
        );
        user
    };

    state.registry.lock().await.bind(
        conn.id(),
        BoundUser {
            user_guid: user.user_guid,
            username: user.username,
        },
    );

    Ok(())
}

/// Encodes and sends one response packet.
async fn send_response(
    conn: &TcpConnection,
    state: &Arc<ServerState>,
    response: &ResponsePacket,
) -> Result<(), PalaverError> {
    let bytes = state.wire.encode_response(response)?;
    conn.send(&bytes).await?;
    Ok(())
}

/// Sends a `Failure` response carrying the failure's error triple.
async fn send_failure(
    conn: &TcpConnection,
    state: &Arc<ServerState>,
    command: Command,
    failure: AuthFailure,
) -> Result<(), PalaverError> {
    let response =
        ResponsePacket::failure(command, failure.to_error_information());
    send_response(conn, state, &response).await
}

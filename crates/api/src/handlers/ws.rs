//! `GET /ws` upgrade (§4.6, §6). Auth is optional here: a connection that
//! never authenticates can still subscribe to public topics, just not
//! `user.<address>` ones (enforced inside the hub itself).

use {
    crate::state::AppState,
    axum::{
        extract::{
            ws::{Message, WebSocket},
            Query, State, WebSocketUpgrade,
        },
        response::Response,
    },
    serde::Deserialize,
};

#[derive(Deserialize)]
pub struct WsParams {
    /// The same `<sigHex>:<nonce>:<timestamp>:<address>` token normally sent
    /// in the `Authorization` header — carried as a query parameter here
    /// since a browser's WebSocket client can't set custom headers on the
    /// upgrade request.
    token: Option<String>,
}

pub async fn upgrade(State(state): State<AppState>, Query(params): Query<WsParams>, ws: WebSocketUpgrade) -> Response {
    let auth = match params.token {
        Some(token) => state
            .auth
            .verify(&format!("Bearer {token}"))
            .await
            .map(|user| user.address)
            .ok(),
        None => None,
    };
    ws.on_upgrade(move |socket| handle_socket(socket, state, auth))
}

async fn handle_socket(socket: WebSocket, state: AppState, auth: Option<model::Address>) {
    use futures::{SinkExt, StreamExt};

    let (mut sink, mut stream) = socket.split();
    let (handle, mut outbound) = state.hub.register(auth).await;

    let writer = tokio::spawn(async move {
        while let Some(message) = outbound.recv().await {
            let Ok(text) = serde_json::to_string(&message) else {
                continue;
            };
            if sink.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(message)) = stream.next().await {
        match message {
            Message::Text(text) => {
                if let Ok(client_message) = serde_json::from_str::<hub::ClientMessage>(&text) {
                    handle.inbound(client_message).await;
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    handle.disconnect().await;
    writer.abort();
}

// src/api/handlers/ws.rs
use actix::{Actor, ActorContext, AsyncContext, Handler, Message, StreamHandler};
use actix_web::{web, HttpRequest, HttpResponse, Error};
use actix_web_actors::ws;
use tokio::sync::watch;
use crate::api::AppState;
use crate::controller::SandboxView;

/// A session view pushed to the page.
#[derive(Message, Clone)]
#[rtype(result = "()")]
pub struct SessionUpdate(pub SandboxView);

/// Streams every view change of the sandbox to one page.
pub struct WsConnection {
    updates: watch::Receiver<SandboxView>,
}

impl WsConnection {
    pub fn new(updates: watch::Receiver<SandboxView>) -> Self {
        Self { updates }
    }

    fn send_view(view: &SandboxView, ctx: &mut ws::WebsocketContext<Self>) {
        if let Ok(json) = serde_json::to_string(view) {
            ctx.text(json);
        }
    }
}

impl Actor for WsConnection {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        let current = self.updates.borrow_and_update().clone();
        Self::send_view(&current, ctx);

        let addr = ctx.address();
        let mut updates = self.updates.clone();
        actix::spawn(async move {
            while updates.changed().await.is_ok() {
                if !addr.connected() {
                    break;
                }
                let view = updates.borrow_and_update().clone();
                addr.do_send(SessionUpdate(view));
            }
        });
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for WsConnection {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => ctx.pong(&msg),
            Ok(ws::Message::Close(reason)) => {
                ctx.close(reason);
                ctx.stop();
            }
            Err(e) => {
                log::warn!("WebSocket protocol error: {}", e);
                ctx.stop();
            }
            _ => (),
        }
    }
}

impl Handler<SessionUpdate> for WsConnection {
    type Result = ();

    fn handle(&mut self, msg: SessionUpdate, ctx: &mut Self::Context) {
        Self::send_view(&msg.0, ctx);
    }
}

/// GET /api/v1/ws - Live session updates
pub async fn ws_handler(
    req: HttpRequest,
    stream: web::Payload,
    state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let conn = WsConnection::new(state.sandbox.subscribe());
    ws::start(conn, &req, stream)
}

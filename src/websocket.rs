//! # WebSocket Conversation Feed
//!
//! Live fan-out of conversation activity. Viewers (the browser UI, mostly)
//! connect to `/ws/conversations` and receive a JSON frame for every message
//! the pipeline stores, voice or text, across all conversations.
//!
//! ## Protocol:
//! - **Server → Client**: `{"type": "message", "message": {...}}` frames
//! - **Heartbeat**: server pings every few seconds; a client that stays
//!   silent past the timeout is disconnected
//! - **Client → Server**: nothing is expected; text and binary frames are
//!   ignored
//!
//! The feed is strictly an observer: it shares the broadcast channel with
//! the pipeline but can never push anything back into it, and a slow or
//! dead viewer only ever loses its own frames.

use crate::events::MessageBroadcaster;
use crate::state::AppState;
use actix::prelude::*;
use actix_web::{web, HttpRequest, HttpResponse, Result as ActixResult};
use actix_web_actors::ws;
use serde_json::json;
use std::time::{Duration, Instant};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

/// How often the server pings a viewer.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);

/// How long a viewer may stay silent before being dropped.
const CLIENT_TIMEOUT: Duration = Duration::from_secs(30);

/// Internal actor message carrying a pre-serialized feed frame.
#[derive(Message)]
#[rtype(result = "()")]
struct FeedFrame(String);

/// One connected viewer.
pub struct ConversationFeed {
    events: MessageBroadcaster,
    last_heartbeat: Instant,
}

impl ConversationFeed {
    pub fn new(events: MessageBroadcaster) -> Self {
        Self {
            events,
            last_heartbeat: Instant::now(),
        }
    }

    fn start_heartbeat(&self, ctx: &mut ws::WebsocketContext<Self>) {
        ctx.run_interval(HEARTBEAT_INTERVAL, |actor, ctx| {
            if Instant::now().duration_since(actor.last_heartbeat) > CLIENT_TIMEOUT {
                info!("viewer heartbeat timed out, disconnecting");
                ctx.stop();
                return;
            }
            ctx.ping(b"");
        });
    }
}

impl Actor for ConversationFeed {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        debug!("conversation feed viewer connected");
        self.start_heartbeat(ctx);

        // Pump the broadcast subscription into this actor. The task ends on
        // its own when either side goes away: a closed channel breaks the
        // loop, and a stopped actor makes try_send fail.
        let mut feed = self.events.subscribe();
        let addr = ctx.address();
        ctx.spawn(actix::fut::wrap_future::<_, Self>(async move {
            loop {
                match feed.recv().await {
                    Ok(message) => {
                        let frame = json!({ "type": "message", "message": message });
                        let payload = match serde_json::to_string(&frame) {
                            Ok(payload) => payload,
                            Err(e) => {
                                warn!(error = %e, "failed to serialize feed frame");
                                continue;
                            }
                        };
                        if addr.try_send(FeedFrame(payload)).is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped = skipped, "slow viewer dropped feed frames");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }));
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        debug!("conversation feed viewer disconnected");
    }
}

impl Handler<FeedFrame> for ConversationFeed {
    type Result = ();

    fn handle(&mut self, frame: FeedFrame, ctx: &mut Self::Context) {
        ctx.text(frame.0);
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for ConversationFeed {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(payload)) => {
                self.last_heartbeat = Instant::now();
                ctx.pong(&payload);
            }
            Ok(ws::Message::Pong(_)) => {
                self.last_heartbeat = Instant::now();
            }
            Ok(ws::Message::Close(reason)) => {
                ctx.close(reason);
                ctx.stop();
            }
            // viewers have nothing to say; ignore chatter but keep the
            // connection alive
            Ok(ws::Message::Text(_)) | Ok(ws::Message::Binary(_)) => {
                self.last_heartbeat = Instant::now();
            }
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "websocket protocol error");
                ctx.stop();
            }
        }
    }
}

/// HTTP upgrade handler for `/ws/conversations`.
pub async fn conversation_feed(
    req: HttpRequest,
    stream: web::Payload,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    ws::start(ConversationFeed::new(state.events.clone()), &req, stream)
}

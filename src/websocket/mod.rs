//! WebSocket Real-Time Delivery
//!
//! Pushes newly created messages to connected clients as they are
//! broadcast. Each connection owns one subscription on the message topic;
//! closing the connection (or dropping it) cancels the subscription and
//! releases its slot.
//!
//! ## Architecture
//!
//! - **Handler**: handles the WebSocket upgrade and the connection loop
//! - **Messages**: defines client and server frame formats
//!
//! ## Usage
//!
//! Clients connect to `/ws`; no subscribe step is needed - the message
//! topic is the only channel. A client that wants history on connect
//! fetches it separately via `GET /api/v1/messages`.
//!
//! ```javascript
//! // Browser
//! const ws = new WebSocket('ws://localhost:8090/ws');
//!
//! ws.onmessage = (event) => {
//!   const frame = JSON.parse(event.data);
//!   if (frame.type === 'message_added') {
//!     console.log(`${frame.message.nickname}: ${frame.message.content}`);
//!   }
//! };
//! ```

mod handler;
mod messages;

pub use handler::websocket_handler;
pub use messages::{ClientMessage, ServerMessage};

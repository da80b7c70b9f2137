//! WebSocket Real-Time Streaming
//!
//! Pushes the full sensor snapshot to dashboard clients.
//!
//! ## Architecture
//!
//! - **ConnectionHub**: Registry of live connections and broadcast fan-out
//! - **Handler**: Handles WebSocket upgrade and message processing
//! - **Messages**: Defines client and server message formats
//!
//! ## Usage
//!
//! Clients connect to `/ws`. They immediately receive a `sensor_update`
//! event with the current snapshot, then one after every applied reading.
//!
//! ## Example
//!
//! ```javascript
//! // Browser
//! const ws = new WebSocket('ws://localhost:5000/ws');
//!
//! ws.onmessage = (event) => {
//!   const msg = JSON.parse(event.data);
//!   if (msg.event === 'sensor_update') {
//!     console.log(msg.data.temperature, msg.data.history.temperature);
//!   }
//! };
//! ```

mod handler;
mod hub;
mod messages;

pub use handler::websocket_handler;
pub use hub::{ConnectionHub, ConnectionId, HubConfig, HubError, SnapshotGate};
pub use messages::{ClientMessage, ServerMessage};

//! # GSEmu Protocol Library
//!
//! Wire format of the GameSpy-style status query spoken by Battlefield 2.
//!
//! ## Layers
//!
//! ### 1. Requests ([`request`])
//! Inbound query datagrams: a 3-byte prefix, the 4-byte timestamp to echo,
//! and uninterpreted trailing bytes.
//!
//! ### 2. Frames ([`frame`])
//! Bounded reply datagrams carrying the echoed timestamp and a sequence byte.
//!
//! ### 3. Encoder ([`encoder`])
//! Serializes the game state into a burst of frames: headers, then player
//! columns, then team columns, split at token boundaries.
//!
//! ### 4. Decoder ([`decoder`])
//! Client-side reassembly of a burst into a [`QueryReply`].
//!
//! ## Usage Example
//!
//! ```rust
//! use gsemu_game::GameState;
//! use gsemu_protocol::{Encoder, Layout, PhaseSelection, QueryReply, QueryRequest, ReplyFrame};
//!
//! let request = QueryRequest::parse(&[0xFE, 0xFD, 0x00, 1, 2, 3, 4, 0xFF, 0xFF, 0xFF]).unwrap();
//! let state = GameState::default();
//!
//! let frames = Encoder::new(&state, request.timestamp)
//!     .encode(PhaseSelection::ALL)
//!     .unwrap();
//!
//! let parsed = frames.iter().map(|f| ReplyFrame::parse(f)).collect::<Result<Vec<_>, _>>().unwrap();
//! let reply = QueryReply::assemble(parsed, Layout::of(&state)).unwrap();
//! assert_eq!(reply.header("hostname"), Some("A PR Server"));
//! ```

pub mod decoder;
pub mod encoder;
pub mod error;
pub mod frame;
pub mod request;

pub use decoder::{Column, Layout, QueryReply, ReplyFrame};
pub use encoder::{Cursor, Encoder, Phase, PhaseSelection, Step};
pub use error::{DecodeError, EncodeError, RequestError};
pub use frame::{
    Frame, DEFAULT_DATAGRAM_SIZE, DEFAULT_FRAME_CAPACITY, FRAME_HEADER_LEN, LAST_FRAME_FLAG,
    MAX_FRAMES,
};
pub use request::{QueryRequest, MIN_REQUEST_LEN};

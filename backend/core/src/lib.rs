pub mod error;
pub mod message;
pub mod traits;
pub mod types;
pub mod value;

pub use error::{CommandError, CommandResult, Presentation};
pub use message::{Embed, EmbedColor, EmbedField, ReplyPayload};
pub use traits::{BufferedResponder, Delivery, Responder};
pub use types::{
    ChannelRef, CommandCategory, Invoker, MemberRef, Permissions, RoleRef, Snowflake, UserRef,
};
pub use value::{ArgValue, CustomValue};

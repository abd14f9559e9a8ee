//! [`Mailer`]-related implementations.

use std::convert::Infallible;

use common::operations::Deliver;
use tracing as log;

/// Mail delivery operation.
pub use common::Handler as Mailer;

/// Addresses of notifications sent by the service.
#[derive(Clone, Debug)]
pub struct Config {
    /// Address notifications are sent from.
    pub sender: String,

    /// Address notifications are sent to.
    pub recipient: String,
}

/// Mail message.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Message {
    /// Sender address.
    pub from: String,

    /// Recipient address.
    pub to: String,

    /// Subject line.
    pub subject: String,

    /// Plain-text body.
    pub body: String,
}

/// [`Mailer`] writing [`Message`]s into the log instead of sending them.
#[derive(Clone, Copy, Debug, Default)]
pub struct Log;

impl Mailer<Deliver<Message>> for Log {
    type Ok = ();
    type Err = Infallible;

    async fn execute(
        &self,
        Deliver(msg): Deliver<Message>,
    ) -> Result<Self::Ok, Self::Err> {
        log::info!(
            from = %msg.from,
            to = %msg.to,
            subject = %msg.subject,
            body = %msg.body,
            "mail delivered",
        );
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod mock {
    //! [`Mailer`] test doubles.

    use std::sync::{Arc, Mutex};

    use common::operations::Deliver;
    use derive_more::{Display, Error};

    use super::{Mailer, Message};

    /// [`Mailer`] remembering all the delivered [`Message`]s.
    #[derive(Clone, Debug, Default)]
    pub(crate) struct Recorder(Arc<Mutex<Vec<Message>>>);

    impl Recorder {
        /// Returns all the delivered [`Message`]s.
        pub(crate) fn delivered(&self) -> Vec<Message> {
            self.0.lock().unwrap().clone()
        }
    }

    impl Mailer<Deliver<Message>> for Recorder {
        type Ok = ();
        type Err = Unreachable;

        async fn execute(
            &self,
            Deliver(msg): Deliver<Message>,
        ) -> Result<Self::Ok, Self::Err> {
            self.0.lock().unwrap().push(msg);
            Ok(())
        }
    }

    /// [`Mailer`] failing every delivery.
    #[derive(Clone, Copy, Debug, Default)]
    pub(crate) struct Broken;

    impl Mailer<Deliver<Message>> for Broken {
        type Ok = ();
        type Err = Unreachable;

        async fn execute(
            &self,
            _: Deliver<Message>,
        ) -> Result<Self::Ok, Self::Err> {
            Err(Unreachable)
        }
    }

    /// Error of a mail server being unreachable.
    #[derive(Clone, Copy, Debug, Display, Error)]
    #[display("mail server is unreachable")]
    pub(crate) struct Unreachable;
}

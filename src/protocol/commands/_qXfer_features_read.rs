use crate::protocol::common::qxfer::QXferReadBase;

/// Only the `target.xml` annex is served, so it is part of the command prefix.
pub type qXferFeaturesRead = QXferReadBase;

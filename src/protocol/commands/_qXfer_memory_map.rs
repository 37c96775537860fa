use crate::protocol::common::qxfer::QXferReadBase;

pub type qXferMemoryMapRead = QXferReadBase;

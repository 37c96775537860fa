use super::prelude::*;

/// The first action of a `vCont` packet.
///
/// Only one core is ever debugged, so actions after the first (which would
/// apply to other threads) are ignored.
#[derive(Debug, PartialEq, Eq)]
pub enum VContAction {
    Continue,
    ContinueWithSignal(u8),
    Step,
    StepWithSignal(u8),
    Stop,
}

#[derive(Debug)]
pub struct vCont {
    pub action: VContAction,
}

impl<'a> ParseCommand<'a> for vCont {
    fn from_packet(buf: PacketBuf<'a>) -> Option<Self> {
        let body = match buf.into_body() {
            [b';', body @ ..] => body,
            _ => return None,
        };
        let first = body.split(|b| *b == b';').next()?;
        // drop any `:thread-id` suffix
        let first = first.split(|b| *b == b':').next()?;

        let action = match first {
            [b'c'] => VContAction::Continue,
            [b's'] => VContAction::Step,
            [b't'] => VContAction::Stop,
            [b'C', sig @ ..] => VContAction::ContinueWithSignal(decode_hex(sig).ok()?),
            [b'S', sig @ ..] => VContAction::StepWithSignal(decode_hex(sig).ok()?),
            _ => return None,
        };

        Some(vCont { action })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &[u8]) -> Option<VContAction> {
        let mut body = body.to_vec();
        vCont::from_packet(PacketBuf::new_with_raw_body(&mut body).unwrap()).map(|p| p.action)
    }

    #[test]
    fn continue_all() {
        assert_eq!(parse(b";c"), Some(VContAction::Continue));
    }

    #[test]
    fn step_one_thread() {
        assert_eq!(parse(b";s:1;c"), Some(VContAction::Step));
    }

    #[test]
    fn continue_with_signal() {
        assert_eq!(parse(b";C05"), Some(VContAction::ContinueWithSignal(5)));
    }

    #[test]
    fn unknown_action() {
        assert_eq!(parse(b";r1000,2000"), None);
        assert_eq!(parse(b""), None);
    }
}

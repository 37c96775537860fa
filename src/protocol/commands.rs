use crate::protocol::packet::PacketBuf;

/// Common imports used by most packet parsers.
mod prelude {
    pub use crate::protocol::commands::ParseCommand;
    pub use crate::protocol::common::hex::{decode_bin_buf, decode_hex, decode_hex_buf};
    pub use crate::protocol::packet::PacketBuf;
}

/// Parse a packet body (with its command prefix already stripped) into a
/// concrete command. Returns `None` if the packet is malformed.
pub trait ParseCommand<'a>: Sized {
    fn from_packet(buf: PacketBuf<'a>) -> Option<Self>;
}

// Entries are matched in declaration order, and the first matching prefix
// wins. Some prefixes are proper prefixes of others (`qC` / `qCRC:`, `vCont` /
// `vCont?`), so the longer form must always be listed first.
macro_rules! commands {
    ($($name:literal => $mod:ident::$command:ident$(<$lifetime:lifetime>)?,)*) => {
        $(
            #[allow(non_snake_case, non_camel_case_types)]
            pub mod $mod;
        )*
        $(pub use $mod::$command;)*

        /// GDB commands
        #[allow(non_camel_case_types)]
        #[derive(Debug)]
        pub enum Command<'a> {
            $($command($command<$($lifetime)?>),)*
            Unknown(&'a [u8]),
        }

        impl<'a> Command<'a> {
            /// Look the packet up in the command table. Unmatched packets
            /// become `Command::Unknown`, malformed ones yield `None`.
            pub fn from_packet(mut buf: PacketBuf<'a>) -> Option<Command<'a>> {
                $(
                    if buf.strip_prefix($name.as_bytes()) {
                        return Some(Command::$command($command::from_packet(buf)?));
                    }
                )*
                Some(Command::Unknown(buf.into_body()))
            }
        }
    };
}

pub mod breakpoint;

commands! {
    "?" => question_mark::QuestionMark,
    "!" => exclamation_mark::ExclamationMark,
    "c" => _c::c,
    "C" => _c_upcase::C,
    "D" => _d_upcase::D,
    "F" => _f_upcase::F,
    "g" => _g::g,
    "G" => _g_upcase::G<'a>,
    "H" => _h_upcase::H,
    "k" => _k::k,
    "m" => _m::m,
    "M" => _m_upcase::M<'a>,
    "p" => _p::p,
    "P" => _p_upcase::P<'a>,
    "r" => _r::r,
    "R" => _r_upcase::R,
    "s" => _s::s,
    "X" => _x_upcase::X<'a>,
    "z" => _z::z,
    "Z" => _z_upcase::Z,

    // query packets
    "qRcmd," => _qRcmd::qRcmd<'a>,
    "qSupported" => _qSupported::qSupported<'a>,
    "qXfer:memory-map:read::" => _qXfer_memory_map::qXferMemoryMapRead,
    "qXfer:features:read:target.xml:" => _qXfer_features_read::qXferFeaturesRead,
    "qCRC:" => _qCRC::qCRC,
    "qC" => _qC::qC,
    "qfThreadInfo" => _qfThreadInfo::qfThreadInfo,
    "qsThreadInfo" => _qsThreadInfo::qsThreadInfo,
    "qAttached" => _qAttached::qAttached,
    "QStartNoAckMode" => _QStartNoAckMode::QStartNoAckMode,

    // verbose packets
    "vAttach;" => _vAttach::vAttach,
    "vKill;" => _vKill::vKill,
    "vRun" => _vRun::vRun<'a>,
    "vFlashErase:" => _vFlashErase::vFlashErase,
    "vFlashWrite:" => _vFlashWrite::vFlashWrite<'a>,
    "vFlashDone" => _vFlashDone::vFlashDone,
    "vStopped" => _vStopped::vStopped,
    "vCont?" => vCont_question_mark::vContQuestionMark,
    "vCont" => _vCont::vCont,
}

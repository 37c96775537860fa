use crc::{Crc, CRC_32_MPEG_2};

use super::prelude::*;
use crate::protocol::commands::_qCRC::qCRC;

/// The CRC-32 variant GDB uses for `compare-sections`: polynomial
/// `0x04C11DB7`, initial value `0xFFFFFFFF`, not reflected, no final xor.
const GDB_CRC: Crc<u32> = Crc::<u32>::new(&CRC_32_MPEG_2);

const CHUNK_SIZE: usize = 128;

impl<C: ConnectionExt> ProbeStubImpl<C> {
    pub(crate) fn handle_crc(
        &mut self,
        res: &mut ResponseWriter<'_, C>,
        registry: &mut TargetRegistry,
        cmd: qCRC,
    ) -> Result<HandlerStatus, Error<C::Error>> {
        let target = match registry.current(&self.session) {
            Some(target) => target,
            None => return Err(Error::NonFatalError(0x01)),
        };

        let mut digest = GDB_CRC.digest();
        let mut chunk = [0; CHUNK_SIZE];
        let mut addr = cmd.addr;
        let mut remaining = cmd.len as usize;
        while remaining > 0 {
            let n = remaining.min(CHUNK_SIZE);
            target
                .mem_read(&mut chunk[..n], addr)
                .handle_error_or(0x03)?;
            digest.update(&chunk[..n]);
            addr = addr.wrapping_add(n as u32);
            remaining -= n;
        }

        res.write_str("C")?;
        res.write_num(digest.finalize())?;
        Ok(HandlerStatus::Handled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gdb_crc_check_value() {
        assert_eq!(GDB_CRC.checksum(b"123456789"), 0x0376_E6E7);
    }

    #[test]
    fn empty_range_is_initial_value() {
        assert_eq!(GDB_CRC.digest().finalize(), 0xffff_ffff);
    }
}

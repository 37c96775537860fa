use alloc::string::String;
use core::fmt::Write;

use super::RamRegion;
use crate::flash::FlashRegion;

/// Render the GDB memory map (`qXfer:memory-map:read`) for a target.
///
/// RAM regions are listed first, followed by flash regions annotated with
/// their erase block size.
pub(super) fn memory_map_xml(ram: &[RamRegion], flash: &[FlashRegion]) -> String {
    let mut xml = String::from("<memory-map>");
    for r in ram {
        let _ = write!(
            xml,
            "<memory type=\"ram\" start=\"0x{:08x}\" length=\"0x{:x}\"/>",
            r.start, r.length
        );
    }
    for f in flash {
        let geom = f.geometry();
        let _ = write!(
            xml,
            "<memory type=\"flash\" start=\"0x{:08x}\" length=\"0x{:x}\">\
             <property name=\"blocksize\">0x{:x}</property></memory>",
            geom.start, geom.length, geom.block_size
        );
    }
    xml.push_str("</memory-map>");
    xml
}

#[cfg(test)]
mod tests {
    use super::*;

    use alloc::boxed::Box;

    use crate::flash::{FlashDriver, FlashGeometry};
    use crate::target::{Target, TargetResult};
    use crate::TargetAddr;

    struct NoFlash;

    impl FlashDriver for NoFlash {
        fn erase(&mut self, _: &mut dyn Target, _: &FlashGeometry, _: TargetAddr, _: u32) -> TargetResult<()> {
            Ok(())
        }

        fn write(&mut self, _: &mut dyn Target, _: &FlashGeometry, _: TargetAddr, _: &[u8]) -> TargetResult<()> {
            Ok(())
        }
    }

    #[test]
    fn empty() {
        assert_eq!(memory_map_xml(&[], &[]), "<memory-map></memory-map>");
    }

    #[test]
    fn ram_then_flash() {
        let ram = [RamRegion {
            start: 0x2000_0000,
            length: 0x5000,
        }];
        let flash = [FlashRegion::new(0x0800_0000, 0x20000, 0x400, 2, 0xff, Box::new(NoFlash))];

        assert_eq!(
            memory_map_xml(&ram, &flash),
            "<memory-map>\
             <memory type=\"ram\" start=\"0x20000000\" length=\"0x5000\"/>\
             <memory type=\"flash\" start=\"0x08000000\" length=\"0x20000\">\
             <property name=\"blocksize\">0x400</property></memory>\
             </memory-map>"
        );
    }
}

//! Register layout declared by a chip driver, and the `target.xml` generated
//! from it.

use alloc::string::String;
use core::fmt::Write;

/// A single register in the target's register file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterInfo {
    /// Register name, as GDB should display it (e.g: `"pc"`).
    pub name: &'static str,
    /// Register width, in bits.
    pub bitsize: u16,
    /// GDB type hint (`"code_ptr"`, `"data_ptr"`, `"ieee_single"`...).
    pub type_: Option<&'static str>,
    /// `false` for registers GDB should not save/restore across inferior
    /// function calls (e.g: banked stack pointers).
    pub save_restore: bool,
}

impl RegisterInfo {
    /// A plain general purpose register.
    pub const fn new(name: &'static str, bitsize: u16) -> RegisterInfo {
        RegisterInfo {
            name,
            bitsize,
            type_: None,
            save_restore: true,
        }
    }

    /// Attach a GDB type hint.
    pub const fn with_type(mut self, type_: &'static str) -> RegisterInfo {
        self.type_ = Some(type_);
        self
    }

    /// Mark the register as not save-restore.
    pub const fn no_save_restore(mut self) -> RegisterInfo {
        self.save_restore = false;
        self
    }

    /// Size of the register's value, in bytes.
    pub fn size(&self) -> usize {
        (self.bitsize as usize + 7) / 8
    }
}

/// Architecture and register file of a target.
#[derive(Debug)]
pub struct TargetDescription {
    /// GDB architecture name (e.g: `"arm"`, `"riscv:rv32"`).
    pub architecture: &'static str,
    /// GDB feature the registers belong to (e.g:
    /// `"org.gnu.gdb.arm.m-profile"`).
    pub feature: &'static str,
    /// Registers, in `g` packet order.
    pub registers: &'static [RegisterInfo],
}

impl TargetDescription {
    /// Total size of the `g` packet register blob, in bytes.
    pub fn regs_size(&self) -> usize {
        self.registers.iter().map(|r| r.size()).sum()
    }

    /// Render the description as a GDB `target.xml` document.
    pub fn to_xml(&self) -> String {
        let mut xml = String::new();
        // writing into a String can't fail
        let _ = self.write_xml(&mut xml);
        xml
    }

    fn write_xml(&self, xml: &mut String) -> core::fmt::Result {
        xml.push_str("<?xml version=\"1.0\"?>");
        xml.push_str("<!DOCTYPE target SYSTEM \"gdb-target.dtd\">");
        write!(xml, "<target><architecture>{}</architecture>", self.architecture)?;
        write!(xml, "<feature name=\"{}\">", self.feature)?;
        for reg in self.registers {
            write!(xml, "<reg name=\"{}\" bitsize=\"{}\"", reg.name, reg.bitsize)?;
            if !reg.save_restore {
                xml.push_str(" save-restore=\"no\"");
            }
            if let Some(type_) = reg.type_ {
                write!(xml, " type=\"{}\"", type_)?;
            }
            xml.push_str("/>");
        }
        xml.push_str("</feature></target>");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static REGS: [RegisterInfo; 3] = [
        RegisterInfo::new("r0", 32),
        RegisterInfo::new("pc", 32).with_type("code_ptr"),
        RegisterInfo::new("msp", 32)
            .with_type("data_ptr")
            .no_save_restore(),
    ];

    static DESC: TargetDescription = TargetDescription {
        architecture: "arm",
        feature: "org.gnu.gdb.arm.m-profile",
        registers: &REGS,
    };

    #[test]
    fn regs_size() {
        assert_eq!(DESC.regs_size(), 12);
        assert_eq!(RegisterInfo::new("fpscr", 33).size(), 5);
    }

    #[test]
    fn xml() {
        let xml = DESC.to_xml();
        assert!(xml.starts_with("<?xml version=\"1.0\"?>"));
        assert!(xml.contains("<architecture>arm</architecture>"));
        assert!(xml.contains("<feature name=\"org.gnu.gdb.arm.m-profile\">"));
        assert!(xml.contains("<reg name=\"r0\" bitsize=\"32\"/>"));
        assert!(xml.contains("<reg name=\"pc\" bitsize=\"32\" type=\"code_ptr\"/>"));
        assert!(xml.contains(
            "<reg name=\"msp\" bitsize=\"32\" save-restore=\"no\" type=\"data_ptr\"/>"
        ));
        assert!(xml.ends_with("</feature></target>"));
    }
}

use std::fmt;
use std::str::FromStr;

/// Memory size used when none is configured.
pub const DEFAULT_MEMORY_SIZE: usize = 1000;

/// Represents complete processor state.
/// Of note - instructions are not stored in `mem`, the runtime indexes them by `ip`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct State {
    /// Flat memory shared by data and the stack
    mem: Box<[i64]>,
    /// Instruction pointer
    ip: i64,
    /// a, b, c, d, e, f, sp, fp
    reg: [i64; 8],
    flags: Flags,
}

/// Set by `cmp` only.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct Flags {
    /// Zero
    pub zf: bool,
    /// Sign
    pub sf: bool,
}

/// Newtype representing an address that has been checked against the memory size.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct Addr(usize);

impl Addr {
    pub fn get(self) -> usize {
        self.0
    }
}

/// Named register slots. `Ip` is not part of the register file but can be addressed like one.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Register {
    A = 0,
    B,
    C,
    D,
    E,
    F,
    /// Stack pointer
    Sp,
    /// Frame pointer
    Fp,
    Ip,
}

impl Register {
    /// Every addressable register, in dump order.
    pub const ALL: [Register; 9] = [
        Register::A,
        Register::B,
        Register::C,
        Register::D,
        Register::E,
        Register::F,
        Register::Sp,
        Register::Fp,
        Register::Ip,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Register::A => "a",
            Register::B => "b",
            Register::C => "c",
            Register::D => "d",
            Register::E => "e",
            Register::F => "f",
            Register::Sp => "sp",
            Register::Fp => "fp",
            Register::Ip => "ip",
        }
    }
}

impl FromStr for Register {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Register::ALL
            .into_iter()
            .find(|reg| reg.name() == s)
            .ok_or(())
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.name())
    }
}

impl State {
    /// `sp` and `fp` start at the last cell. `None` if `mem_size` is zero, the stack needs a
    /// cell to point at.
    pub fn new(mem_size: usize) -> Option<Self> {
        let top = i64::try_from(mem_size.checked_sub(1)?).ok()?;
        let mut reg = [0; 8];
        reg[Register::Sp as usize] = top;
        reg[Register::Fp as usize] = top;
        Some(State {
            mem: vec![0; mem_size].into_boxed_slice(),
            ip: 0,
            reg,
            flags: Flags::default(),
        })
    }

    #[inline]
    pub fn reg(&self, reg: Register) -> i64 {
        match reg {
            Register::Ip => self.ip,
            _ => self.reg[reg as usize],
        }
    }

    #[inline]
    pub fn reg_mut(&mut self, reg: Register) -> &mut i64 {
        match reg {
            Register::Ip => &mut self.ip,
            _ => &mut self.reg[reg as usize],
        }
    }

    pub fn ip(&self) -> i64 {
        self.ip
    }

    pub fn set_ip(&mut self, ip: i64) {
        self.ip = ip;
    }

    pub fn flags(&self) -> Flags {
        self.flags
    }

    pub fn set_flags(&mut self, flags: Flags) {
        self.flags = flags;
    }

    pub fn mem_size(&self) -> usize {
        self.mem.len()
    }

    /// Check a computed address against memory, `None` if it falls outside `[0, mem_size)`.
    pub fn addr(&self, raw: i64) -> Option<Addr> {
        usize::try_from(raw)
            .ok()
            .filter(|&idx| idx < self.mem.len())
            .map(Addr)
    }

    #[inline]
    pub fn mem(&self, addr: Addr) -> i64 {
        self.mem[addr.0]
    }

    #[inline]
    pub fn mem_mut(&mut self, addr: Addr) -> &mut i64 {
        &mut self.mem[addr.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stack_and_frame_start_at_top() {
        let state = State::new(16).unwrap();
        assert_eq!(state.reg(Register::Sp), 15);
        assert_eq!(state.reg(Register::Fp), 15);
        assert_eq!(state.ip(), 0);
        assert_eq!(state.flags(), Flags::default());
        let state = State::new(DEFAULT_MEMORY_SIZE).unwrap();
        assert_eq!(state.reg(Register::Sp), 999);
        assert_eq!(state.mem_size(), 1000);
    }

    #[test]
    fn empty_memory_is_refused() {
        assert_eq!(State::new(0), None);
        let state = State::new(1).unwrap();
        assert_eq!(state.reg(Register::Sp), 0);
    }

    #[test]
    fn register_names() {
        for reg in Register::ALL {
            assert_eq!(reg.name().parse::<Register>(), Ok(reg));
        }
        assert!("g".parse::<Register>().is_err());
        assert!("SP".parse::<Register>().is_err());
        assert_eq!(Register::Fp.to_string(), "%fp");
    }

    #[test]
    fn ip_is_addressable_as_register() {
        let mut state = State::new(4).unwrap();
        *state.reg_mut(Register::Ip) = 7;
        assert_eq!(state.ip(), 7);
        assert_eq!(state.reg(Register::Ip), 7);
    }

    #[test]
    fn addresses_are_never_clamped() {
        let mut state = State::new(4).unwrap();
        let top = state.addr(3).unwrap();
        *state.mem_mut(top) = 42;
        assert_eq!(state.mem(top), 42);
        assert_eq!(state.addr(4), None);
        assert_eq!(state.addr(-1), None);
        assert_eq!(state.addr(i64::MAX), None);
    }
}

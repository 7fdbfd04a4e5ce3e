use crate::error::ExecError;
use crate::lexer::lex_operand;
use crate::state::{Addr, Register, State};

/// The five operand forms.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum OperandKind {
    /// `$n`
    Imm(i64),
    /// `%r`
    Reg(Register),
    /// `n`
    Direct(i64),
    /// `(%r)`
    Indirect(Register),
    /// `n(%r)`
    Indexed { offset: i64, base: Register },
}

/// A lexed operand, still attached to its source token for error reporting.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Operand {
    pub kind: OperandKind,
    pub token: String,
}

/// A writable storage slot.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Location {
    Register(Register),
    Memory(Addr),
}

impl Location {
    pub fn get(self, state: &State) -> i64 {
        match self {
            Location::Register(reg) => state.reg(reg),
            Location::Memory(addr) => state.mem(addr),
        }
    }

    pub fn set(self, state: &mut State, val: i64) {
        match self {
            Location::Register(reg) => *state.reg_mut(reg) = val,
            Location::Memory(addr) => *state.mem_mut(addr) = val,
        }
    }
}

impl Operand {
    pub fn parse(token: &str) -> Result<Self, ExecError> {
        Ok(Operand {
            kind: lex_operand(token)?,
            token: token.to_owned(),
        })
    }

    pub fn is_immediate(&self) -> bool {
        matches!(self.kind, OperandKind::Imm(_))
    }

    /// Resolve to a storage slot. Only reads `state`.
    pub fn location(&self, state: &State) -> Result<Location, ExecError> {
        let raw = match self.kind {
            OperandKind::Imm(_) => {
                return Err(ExecError::NotWritable {
                    token: self.token.clone(),
                })
            }
            OperandKind::Reg(reg) => return Ok(Location::Register(reg)),
            OperandKind::Direct(addr) => Some(addr),
            OperandKind::Indirect(base) => Some(state.reg(base)),
            OperandKind::Indexed { offset, base } => state.reg(base).checked_add(offset),
        };
        raw.and_then(|raw| state.addr(raw))
            .map(Location::Memory)
            .ok_or_else(|| ExecError::out_of_bounds(&self.token, raw))
    }

    pub fn value(&self, state: &State) -> Result<i64, ExecError> {
        match self.kind {
            OperandKind::Imm(val) => Ok(val),
            _ => Ok(self.location(state)?.get(state)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> State {
        let mut state = State::new(10).unwrap();
        *state.reg_mut(Register::A) = 4;
        *state.reg_mut(Register::B) = -1;
        for i in 0..10 {
            let addr = state.addr(i).unwrap();
            *state.mem_mut(addr) = i * 100;
        }
        state
    }

    fn value(token: &str) -> Result<i64, ExecError> {
        Operand::parse(token)?.value(&state())
    }

    #[test]
    fn read_values() {
        assert_eq!(value("$-12"), Ok(-12));
        assert_eq!(value("%a"), Ok(4));
        assert_eq!(value("%sp"), Ok(9));
        assert_eq!(value("%ip"), Ok(0));
        assert_eq!(value("7"), Ok(700));
        assert_eq!(value("(%a)"), Ok(400));
        assert_eq!(value("(%sp)"), Ok(900));
        assert_eq!(value("-2(%sp)"), Ok(700));
        assert_eq!(value("3(%a)"), Ok(700));
        assert_eq!(value("1(%b)"), Ok(0));
    }

    #[test]
    fn write_through_location() {
        let mut state = state();
        let loc = Operand::parse("2(%a)").unwrap().location(&state).unwrap();
        assert_eq!(loc, Location::Memory(state.addr(6).unwrap()));
        loc.set(&mut state, -5);
        assert_eq!(Operand::parse("6").unwrap().value(&state), Ok(-5));

        let loc = Operand::parse("%fp").unwrap().location(&state).unwrap();
        loc.set(&mut state, 3);
        assert_eq!(loc.get(&state), 3);
        assert_eq!(state.reg(Register::Fp), 3);
    }

    #[test]
    fn out_of_bounds() {
        for (token, addr) in [
            ("10", Some(10)),
            ("(%b)", Some(-1)),
            ("6(%a)", Some(10)),
            ("-5(%a)", Some(-1)),
        ] {
            assert_eq!(
                value(token),
                Err(ExecError::OutOfBounds {
                    token: token.into(),
                    addr
                })
            );
        }
    }

    #[test]
    fn overflowing_address() {
        let mut state = state();
        *state.reg_mut(Register::C) = i64::MAX;
        let op = Operand::parse("1(%c)").unwrap();
        assert_eq!(
            op.location(&state),
            Err(ExecError::OutOfBounds {
                token: "1(%c)".into(),
                addr: None
            })
        );
    }

    #[test]
    fn immediate_is_not_writable() {
        let op = Operand::parse("$3").unwrap();
        assert!(op.is_immediate());
        assert_eq!(
            op.location(&state()),
            Err(ExecError::NotWritable { token: "$3".into() })
        );
    }
}

use std::io::{self, Write};

use crate::error::{ExecError, Fault};
use crate::instr::{Cond, Instr};
use crate::operand::{Location, Operand};
use crate::output;
use crate::program::{Line, Program};
use crate::state::{Addr, Flags, Register, State};

/// Runs one program on one processor. `p` dumps are written to `W`.
pub struct Runtime<W = io::Stdout> {
    program: Program,
    state: State,
    out: W,
    trace: bool,
}

impl Runtime {
    /// `None` if `mem_size` is zero.
    pub fn with_memory_size(program: Program, mem_size: usize) -> Option<Self> {
        let state = State::new(mem_size)?;
        Some(Runtime::with_output(program, state, io::stdout()))
    }
}

impl<W: Write> Runtime<W> {
    pub fn with_output(program: Program, state: State, out: W) -> Self {
        Runtime {
            program,
            state,
            out,
            trace: false,
        }
    }

    /// Echo each instruction to stderr before it runs.
    pub fn set_trace(&mut self, trace: bool) {
        self.trace = trace;
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut State {
        &mut self.state
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    pub fn into_output(self) -> W {
        self.out
    }

    pub fn is_finished(&self) -> bool {
        self.state.ip() >= self.program.len() as i64
    }

    /// Run until `ip` passes the last instruction.
    pub fn run(&mut self) -> Result<(), Fault> {
        while self.step()? {}
        Ok(())
    }

    /// Execute the instruction at `ip`. Returns `false`, without doing anything, once the
    /// program has finished.
    ///
    /// On error, the processor is left exactly as it was before the call.
    pub fn step(&mut self) -> Result<bool, Fault> {
        let ip = self.state.ip();
        let Ok(idx) = usize::try_from(ip) else {
            return Err(Fault::new(ip, "", None, ExecError::InvalidIp { ip }));
        };
        let Some(line) = self.program.get(idx) else {
            return Ok(false);
        };
        if self.trace {
            output::print_trace(ip, line.text());
        }

        // ip incremented before instruction is performed
        self.state.set_ip(ip + 1);
        let mut exec = Exec {
            state: &mut self.state,
            program: &self.program,
            out: &mut self.out,
        };
        if let Err(error) = line.instr().and_then(|instr| exec.execute(instr)) {
            self.state.set_ip(ip);
            return Err(Fault::new(ip, line.text(), Some(line.span()), error));
        }
        Ok(true)
    }
}

/// Borrowed view of a runtime while one instruction executes.
///
/// Every handler resolves all of its operands and checks every address before its first write.
struct Exec<'a, W> {
    state: &'a mut State,
    program: &'a Program,
    out: &'a mut W,
}

impl<W: Write> Exec<'_, W> {
    fn execute(&mut self, instr: &Instr) -> Result<(), ExecError> {
        match instr {
            Instr::Mov { src, dst } => {
                let val = self.value(src)?;
                let dst = self.location(dst)?;
                dst.set(self.state, val);
            }
            Instr::Add { src, dst } => self.arith(src, dst, i64::wrapping_add)?,
            Instr::Sub { src, dst } => self.arith(src, dst, i64::wrapping_sub)?,
            Instr::Mul { src, dst } => self.arith(src, dst, i64::wrapping_mul)?,
            Instr::Inc { dst } => self.modify(dst, |val| val.wrapping_add(1))?,
            Instr::Dec { dst } => self.modify(dst, |val| val.wrapping_sub(1))?,
            Instr::Cmp { a, b } => {
                let a = self.value(a)?;
                let b = self.value(b)?;
                let res = b.wrapping_sub(a);
                self.state.set_flags(Flags {
                    zf: res == 0,
                    sf: res < 0,
                });
            }
            Instr::Jump { cond, label } => self.jump(*cond, label)?,
            Instr::Push { src } => self.push(src)?,
            Instr::Pop { dst } => {
                let dst = self.location(dst)?;
                self.pop_into(dst)?;
            }
            Instr::Call { label } => {
                let target = self.label(label)?;
                self.push_val(self.state.ip())?;
                self.state.set_ip(target);
            }
            Instr::Ret => self.pop_into(Location::Register(Register::Ip))?,
            Instr::Leave => self.leave()?,
            Instr::Print => self.print()?,
        }
        Ok(())
    }

    fn value(&self, op: &Operand) -> Result<i64, ExecError> {
        op.value(&*self.state)
    }

    fn location(&self, op: &Operand) -> Result<Location, ExecError> {
        op.location(&*self.state)
    }

    fn label(&self, name: &str) -> Result<i64, ExecError> {
        self.program
            .label(name)
            .map(|idx| idx as i64)
            .ok_or_else(|| ExecError::UndefinedLabel {
                label: name.to_owned(),
            })
    }

    fn stack_addr(&self, reg: Register, raw: i64) -> Result<Addr, ExecError> {
        self.state
            .addr(raw)
            .ok_or_else(|| ExecError::out_of_bounds(&reg.to_string(), Some(raw)))
    }

    /// `dst := op(dst, src)`
    fn arith(
        &mut self,
        src: &Operand,
        dst: &Operand,
        op: fn(i64, i64) -> i64,
    ) -> Result<(), ExecError> {
        let val = self.value(src)?;
        let dst = self.location(dst)?;
        let cur = dst.get(&*self.state);
        dst.set(self.state, op(cur, val));
        Ok(())
    }

    fn modify(&mut self, dst: &Operand, op: impl FnOnce(i64) -> i64) -> Result<(), ExecError> {
        let dst = self.location(dst)?;
        let cur = dst.get(&*self.state);
        dst.set(self.state, op(cur));
        Ok(())
    }

    fn jump(&mut self, cond: Cond, name: &str) -> Result<(), ExecError> {
        // Missing labels are an error even when the jump is not taken
        let target = self.label(name)?;
        if cond.holds(self.state.flags()) {
            self.state.set_ip(target);
        }
        Ok(())
    }

    fn push(&mut self, src: &Operand) -> Result<(), ExecError> {
        let sp = self.state.reg(Register::Sp);
        let new_sp = sp.wrapping_sub(1);

        // Source is read with the stack pointer already decremented
        *self.state.reg_mut(Register::Sp) = new_sp;
        let pushed = src
            .value(&*self.state)
            .and_then(|val| Ok((self.stack_addr(Register::Sp, new_sp)?, val)));
        match pushed {
            Ok((addr, val)) => {
                *self.state.mem_mut(addr) = val;
                Ok(())
            }
            Err(err) => {
                *self.state.reg_mut(Register::Sp) = sp;
                Err(err)
            }
        }
    }

    fn push_val(&mut self, val: i64) -> Result<(), ExecError> {
        let new_sp = self.state.reg(Register::Sp).wrapping_sub(1);
        let addr = self.stack_addr(Register::Sp, new_sp)?;
        *self.state.mem_mut(addr) = val;
        *self.state.reg_mut(Register::Sp) = new_sp;
        Ok(())
    }

    fn pop_into(&mut self, dst: Location) -> Result<(), ExecError> {
        let sp = self.state.reg(Register::Sp);
        let addr = self.stack_addr(Register::Sp, sp)?;
        let val = self.state.mem(addr);
        dst.set(self.state, val);
        // Re-read, `dst` may be the stack pointer itself
        let sp = self.state.reg(Register::Sp);
        *self.state.reg_mut(Register::Sp) = sp.wrapping_add(1);
        Ok(())
    }

    /// `sp := fp`, then pop into `fp`.
    fn leave(&mut self) -> Result<(), ExecError> {
        let fp = self.state.reg(Register::Fp);
        let addr = self.stack_addr(Register::Fp, fp)?;
        let saved_fp = self.state.mem(addr);
        *self.state.reg_mut(Register::Fp) = saved_fp;
        *self.state.reg_mut(Register::Sp) = fp.wrapping_add(1);
        Ok(())
    }

    fn print(&mut self) -> Result<(), ExecError> {
        let next = usize::try_from(self.state.ip())
            .ok()
            .and_then(|idx| self.program.get(idx))
            .map(Line::text);
        output::print_registers(&mut *self.out, &*self.state, next).map_err(|err| {
            ExecError::Output {
                reason: err.to_string(),
            }
        })
    }
}

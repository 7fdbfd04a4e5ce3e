use crate::error::ExecError;
use crate::lexer::cursor::Cursor;
use crate::operand::OperandKind;
use crate::state::Register;

pub mod cursor;

/// Test if a character may appear in a register name.
pub(crate) fn is_id(c: char) -> bool {
    matches!(c, 'a'..='z' | 'A'..='Z' | '0'..='9' | '_')
}

/// Classify a single operand token. Never looks at processor state.
pub fn lex_operand(token: &str) -> Result<OperandKind, ExecError> {
    let mut cur = Cursor::new(token);
    let kind = match cur.first() {
        // Immediate
        Some('$') => {
            cur.bump();
            OperandKind::Imm(cur.lex_int(token)?)
        }
        Some('%') => OperandKind::Reg(cur.lex_reg(token)?),
        // Indirect memory
        Some('(') => OperandKind::Indirect(cur.lex_base(token)?),
        // Direct or indexed memory, told apart by what follows the number
        Some(c) if c == '-' || c.is_ascii_digit() => {
            let num = cur.lex_int(token)?;
            if cur.is_eof() {
                if num < 0 {
                    return Err(ExecError::malformed(token));
                }
                OperandKind::Direct(num)
            } else {
                OperandKind::Indexed {
                    offset: num,
                    base: cur.lex_base(token)?,
                }
            }
        }
        _ => return Err(ExecError::malformed(token)),
    };
    if !cur.is_eof() {
        return Err(ExecError::malformed(token));
    }
    Ok(kind)
}

impl Cursor<'_> {
    /// Decimal integer with an optional leading `-`.
    fn lex_int(&mut self, token: &str) -> Result<i64, ExecError> {
        let start = self.curr_pt();
        self.eat('-');
        if self.take_while(|c| c.is_ascii_digit()).is_empty() {
            return Err(ExecError::malformed(token));
        }
        // Only fails on overflow
        self.since(start)
            .parse()
            .map_err(|_| ExecError::malformed(token))
    }

    /// `%name`
    fn lex_reg(&mut self, token: &str) -> Result<Register, ExecError> {
        if !self.eat('%') {
            return Err(ExecError::malformed(token));
        }
        let name = self.take_while(is_id);
        if name.is_empty() {
            return Err(ExecError::malformed(token));
        }
        name.parse().map_err(|_| ExecError::UnknownRegister {
            token: token.to_owned(),
        })
    }

    /// `(%name)`
    fn lex_base(&mut self, token: &str) -> Result<Register, ExecError> {
        if !self.eat('(') {
            return Err(ExecError::malformed(token));
        }
        let reg = self.lex_reg(token)?;
        if !self.eat(')') {
            return Err(ExecError::malformed(token));
        }
        Ok(reg)
    }
}

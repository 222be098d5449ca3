use log::debug;

use crate::diagnostics::Diagnostics;
use crate::error::CompileError;
use crate::ir::instr::{Instruction, InstructionStream, Opcode};
use crate::ir::symbols::{SymbolEntry, SymbolTable, Type};
use super::cursor::TokenCursor;
use super::lexer::{Token, TokenKind};

/// Everything a successful run hands to the report layer.
#[derive(Debug, Clone)]
pub struct Translation {
    pub tokens: Vec<Token>,
    pub trace: Vec<String>,
    pub symbols: Vec<SymbolEntry>,
    pub instructions: Vec<Instruction>,
}

pub fn translate_tokens(tokens: Vec<Token>, trace: bool) -> Result<Translation, CompileError> {
    let mut translator = Translator::new(tokens, trace);
    translator.rat25s()?;
    translator.finish()
}

#[derive(Debug, Clone, Copy)]
enum IdsAction {
    Declare(Type),
    Scan,
}

/// Parser context. Each grammar procedure matches its production and
/// performs the production's semantic actions in the same step.
struct Translator {
    cursor: TokenCursor,
    symbols: SymbolTable,
    code: InstructionStream,
    diagnostics: Diagnostics,
}

impl Translator {
    fn new(tokens: Vec<Token>, trace: bool) -> Self {
        Self {
            cursor: TokenCursor::new(tokens),
            symbols: SymbolTable::new(),
            code: InstructionStream::new(),
            diagnostics: Diagnostics::new(trace),
        }
    }

    fn finish(self) -> Result<Translation, CompileError> {
        let tokens = self.cursor.consumed().to_vec();
        let instructions = self.code.finish()?;
        debug!(
            "translated {} tokens into {} instructions, {} symbols",
            tokens.len(),
            instructions.len(),
            self.symbols.len()
        );
        let symbols: Vec<SymbolEntry> = self.symbols.entries().cloned().collect();
        Ok(Translation {
            tokens,
            trace: self.diagnostics.into_trace(),
            symbols,
            instructions,
        })
    }

    fn rat25s(&mut self) -> Result<(), CompileError> {
        self.production(
            "<Rat25S> -> $$ <Opt Function Definitions> $$ <Opt Declaration List> $$ <Statement List> $$",
        );
        self.separator("$$")?;
        self.opt_function_definitions();
        self.separator("$$")?;
        self.opt_declaration_list()?;
        self.separator("$$")?;
        if self.symbols.is_empty() {
            debug!("no identifiers declared");
        }
        self.statement_list()?;
        self.separator("$$")?;

        if !self.cursor.is_at_end() {
            return Err(self.cursor.unexpected("end of input"));
        }
        Ok(())
    }

    // Function definitions are not part of the language; a `function`
    // keyword is left for the following `$$` to reject.
    fn opt_function_definitions(&mut self) {
        self.production("<Opt Function Definitions> -> ε");
    }

    fn opt_declaration_list(&mut self) -> Result<(), CompileError> {
        if self.at_qualifier() {
            self.production("<Opt Declaration List> -> <Declaration List>");
            self.declaration_list()
        } else {
            self.production("<Opt Declaration List> -> ε");
            Ok(())
        }
    }

    fn declaration_list(&mut self) -> Result<(), CompileError> {
        loop {
            self.production("<Declaration List> -> <Declaration> ; <Declaration List'>");
            self.declaration()?;
            self.separator(";")?;

            if !self.at_qualifier() {
                self.production("<Declaration List'> -> ε");
                return Ok(());
            }
            self.production("<Declaration List'> -> <Declaration List>");
        }
    }

    fn declaration(&mut self) -> Result<(), CompileError> {
        self.production("<Declaration> -> <Qualifier> <IDs>");
        let ty = self.qualifier()?;
        self.ids(IdsAction::Declare(ty))
    }

    fn qualifier(&mut self) -> Result<Type, CompileError> {
        let ty = if self.at(TokenKind::Keyword, "integer") {
            Type::Integer
        } else if self.at(TokenKind::Keyword, "boolean") {
            Type::Boolean
        } else {
            return Err(self.cursor.unexpected("'integer' or 'boolean'"));
        };
        self.production(&format!("<Qualifier> -> {}", ty));
        self.consume()?;
        Ok(ty)
    }

    fn ids(&mut self, action: IdsAction) -> Result<(), CompileError> {
        loop {
            self.production("<IDs> -> <Identifier> <IDs'>");
            let ident = self.identifier()?;

            match action {
                IdsAction::Declare(ty) => {
                    let address = self.symbols.declare(&ident.lexeme, ty, ident.line)?;
                    debug!("declared {} {} at {}", ty, ident.lexeme, address);
                }
                IdsAction::Scan => {
                    let address = self.symbols.resolve(&ident.lexeme, ident.line)?.address;
                    self.code.emit(Opcode::Sin, None);
                    self.code.emit(Opcode::PopM, Some(address as i64));
                }
            }

            if !self.at(TokenKind::Separator, ",") {
                self.production("<IDs'> -> ε");
                return Ok(());
            }
            self.production("<IDs'> -> , <IDs>");
            self.consume()?;
        }
    }

    fn statement_list(&mut self) -> Result<(), CompileError> {
        while self.at_statement() {
            self.production("<Statement List> -> <Statement> <Statement List>");
            self.statement()?;
        }
        self.production("<Statement List> -> ε");
        Ok(())
    }

    fn statement(&mut self) -> Result<(), CompileError> {
        let token = self.cursor.peek().clone();
        match (token.kind, token.lexeme.as_str()) {
            (TokenKind::Separator, "{") => {
                self.production("<Statement> -> <Compound>");
                self.compound()
            }
            (TokenKind::Identifier, _) => {
                self.production("<Statement> -> <Assign>");
                self.assign()
            }
            (TokenKind::Keyword, "if") => {
                self.production("<Statement> -> <If>");
                self.if_statement()
            }
            (TokenKind::Keyword, "return") => {
                self.production("<Statement> -> <Return>");
                self.return_statement()
            }
            (TokenKind::Keyword, "print") => {
                self.production("<Statement> -> <Print>");
                self.print_statement()
            }
            (TokenKind::Keyword, "scan") => {
                self.production("<Statement> -> <Scan>");
                self.scan_statement()
            }
            (TokenKind::Keyword, "while") => {
                self.production("<Statement> -> <While>");
                self.while_statement()
            }
            _ => Err(self.cursor.unexpected("statement")),
        }
    }

    fn compound(&mut self) -> Result<(), CompileError> {
        self.production("<Compound> -> { <Statement List> }");
        self.separator("{")?;
        self.statement_list()?;
        self.separator("}")?;
        Ok(())
    }

    fn assign(&mut self) -> Result<(), CompileError> {
        self.production("<Assign> -> <Identifier> = <Expression> ;");
        let target = self.identifier()?;
        self.operator("=")?;
        let value_ty = self.expression()?;

        let entry = self.symbols.resolve(&target.lexeme, target.line)?;
        let (address, target_ty) = (entry.address, entry.ty);
        if target_ty != value_ty {
            return Err(CompileError::TypeMismatch {
                lexeme: target.lexeme,
                line: target.line,
                expected: target_ty,
                found: value_ty,
            });
        }
        self.code.emit(Opcode::PopM, Some(address as i64));

        self.separator(";")?;
        Ok(())
    }

    fn if_statement(&mut self) -> Result<(), CompileError> {
        self.production("<If> -> if ( <Condition> ) <Statement> <If Tail>");
        self.keyword("if")?;
        self.separator("(")?;
        self.condition()?;
        self.separator(")")?;

        let jump_if_false = self.code.reserve(Opcode::Jump0);
        self.statement()?;

        if self.at(TokenKind::Keyword, "else") {
            self.production("<If Tail> -> else <Statement> endif");
            let skip_else = self.code.reserve(Opcode::Jump);
            self.keyword("else")?;
            let else_start = self.next_index();
            self.code.patch(jump_if_false, else_start)?;

            self.statement()?;
            self.keyword("endif")?;
            let after = self.next_index();
            self.code.patch(skip_else, after)?;
        } else {
            self.production("<If Tail> -> endif");
            self.keyword("endif")?;
            let after = self.next_index();
            self.code.patch(jump_if_false, after)?;
        }
        Ok(())
    }

    fn return_statement(&mut self) -> Result<(), CompileError> {
        self.production("<Return> -> return <Return Tail>");
        self.keyword("return")?;

        if self.at(TokenKind::Separator, ";") {
            self.production("<Return Tail> -> ;");
        } else {
            self.production("<Return Tail> -> <Expression> ;");
            self.expression()?;
        }
        self.separator(";")?;
        Ok(())
    }

    fn print_statement(&mut self) -> Result<(), CompileError> {
        self.production("<Print> -> print ( <Expression> ) ;");
        self.keyword("print")?;
        self.separator("(")?;
        self.expression()?;
        self.separator(")")?;
        self.code.emit(Opcode::Sout, None);
        self.separator(";")?;
        Ok(())
    }

    fn scan_statement(&mut self) -> Result<(), CompileError> {
        self.production("<Scan> -> scan ( <IDs> ) ;");
        self.keyword("scan")?;
        self.separator("(")?;
        self.ids(IdsAction::Scan)?;
        self.separator(")")?;
        self.separator(";")?;
        Ok(())
    }

    fn while_statement(&mut self) -> Result<(), CompileError> {
        self.production("<While> -> while ( <Condition> ) <Statement> endwhile");
        self.keyword("while")?;
        self.separator("(")?;

        let loop_start = self.next_index();
        self.condition()?;
        self.separator(")")?;
        let exit = self.code.reserve(Opcode::Jump0);

        self.statement()?;
        self.keyword("endwhile")?;

        self.code.emit(Opcode::Jump, Some(loop_start));
        let after = self.next_index();
        self.code.patch(exit, after)?;
        Ok(())
    }

    fn condition(&mut self) -> Result<(), CompileError> {
        self.production("<Condition> -> <Expression> <Relop> <Expression>");
        let left = self.expression()?;
        let (relop, opcode) = self.relop()?;
        let right = self.expression()?;

        if left != right {
            return Err(CompileError::TypeMismatch {
                lexeme: relop.lexeme,
                line: relop.line,
                expected: left,
                found: right,
            });
        }
        self.code.emit(opcode, None);
        Ok(())
    }

    fn relop(&mut self) -> Result<(Token, Opcode), CompileError> {
        let token = self.cursor.peek().clone();
        let opcode = match (token.kind, token.lexeme.as_str()) {
            (TokenKind::Operator, "==") => Opcode::Equ,
            (TokenKind::Operator, "!=") => Opcode::Neq,
            (TokenKind::Operator, ">") => Opcode::Grt,
            (TokenKind::Operator, "<") => Opcode::Les,
            (TokenKind::Operator, "<=") => Opcode::Leq,
            (TokenKind::Operator, "=>" | ">=") => Opcode::Geq,
            _ => return Err(self.cursor.unexpected("relational operator")),
        };
        self.production(&format!("<Relop> -> {}", token.lexeme));
        let relop = self.consume()?;
        Ok((relop, opcode))
    }

    // The <Expression'> and <Term'> tails are iterated, not recursed.
    fn expression(&mut self) -> Result<Type, CompileError> {
        self.production("<Expression> -> <Term> <Expression'>");
        let mut left = self.term()?;

        loop {
            let opcode = if self.at(TokenKind::Operator, "+") {
                Opcode::A
            } else if self.at(TokenKind::Operator, "-") {
                Opcode::S
            } else {
                self.production("<Expression'> -> ε");
                return Ok(left);
            };

            let rule = format!(
                "<Expression'> -> {} <Term> <Expression'>",
                self.cursor.peek().lexeme
            );
            self.production(&rule);
            let operator = self.consume()?;
            require_integer(&operator, left)?;
            let right = self.term()?;
            require_integer(&operator, right)?;
            self.code.emit(opcode, None);
            left = Type::Integer;
        }
    }

    fn term(&mut self) -> Result<Type, CompileError> {
        self.production("<Term> -> <Factor> <Term'>");
        let mut left = self.factor()?;

        loop {
            let opcode = if self.at(TokenKind::Operator, "*") {
                Opcode::M
            } else if self.at(TokenKind::Operator, "/") {
                Opcode::D
            } else {
                self.production("<Term'> -> ε");
                return Ok(left);
            };

            let rule = format!("<Term'> -> {} <Factor> <Term'>", self.cursor.peek().lexeme);
            self.production(&rule);
            let operator = self.consume()?;
            require_integer(&operator, left)?;
            let right = self.factor()?;
            require_integer(&operator, right)?;
            self.code.emit(opcode, None);
            left = Type::Integer;
        }
    }

    // Negation is always 0 - operand.
    fn factor(&mut self) -> Result<Type, CompileError> {
        if !self.at(TokenKind::Operator, "-") {
            self.production("<Factor> -> <Primary>");
            return self.primary();
        }

        self.production("<Factor> -> - <Primary>");
        let minus = self.consume()?;
        self.code.emit(Opcode::PushI, Some(0));
        let operand = self.primary()?;
        require_integer(&minus, operand)?;
        self.code.emit(Opcode::S, None);
        Ok(Type::Integer)
    }

    fn primary(&mut self) -> Result<Type, CompileError> {
        let token = self.cursor.peek().clone();
        match (token.kind, token.lexeme.as_str()) {
            (TokenKind::Identifier, _) => {
                self.production("<Primary> -> <Identifier>");
                let ident = self.consume()?;
                let entry = self.symbols.resolve(&ident.lexeme, ident.line)?;
                let (address, ty) = (entry.address, entry.ty);
                self.code.emit(Opcode::PushM, Some(address as i64));
                Ok(ty)
            }
            (TokenKind::Integer, _) => {
                self.production("<Primary> -> <Integer>");
                let literal = self.consume()?;
                let value = literal
                    .lexeme
                    .parse::<i64>()
                    .map_err(|_| CompileError::SyntaxError {
                        expected: "integer literal".to_string(),
                        found: literal.lexeme.clone(),
                        line: literal.line,
                    })?;
                self.code.emit(Opcode::PushI, Some(value));
                Ok(Type::Integer)
            }
            (TokenKind::Boolean, _) => {
                self.production(&format!("<Primary> -> {}", token.lexeme));
                let literal = self.consume()?;
                let value = if literal.lexeme == "true" { 1 } else { 0 };
                self.code.emit(Opcode::PushI, Some(value));
                Ok(Type::Boolean)
            }
            (TokenKind::Separator, "(") => {
                self.production("<Primary> -> ( <Expression> )");
                self.separator("(")?;
                let ty = self.expression()?;
                self.separator(")")?;
                Ok(ty)
            }
            _ => Err(self.cursor.unexpected("expression")),
        }
    }

    // Lookahead and token helpers

    fn production(&mut self, rule: &str) {
        self.diagnostics.production(rule);
    }

    fn at(&self, kind: TokenKind, lexeme: &str) -> bool {
        self.cursor.peek().is(kind, lexeme)
    }

    fn at_qualifier(&self) -> bool {
        self.at(TokenKind::Keyword, "integer") || self.at(TokenKind::Keyword, "boolean")
    }

    fn at_statement(&self) -> bool {
        let token = self.cursor.peek();
        match token.kind {
            TokenKind::Identifier => true,
            TokenKind::Separator => token.lexeme == "{",
            TokenKind::Keyword => matches!(
                token.lexeme.as_str(),
                "if" | "while" | "return" | "print" | "scan"
            ),
            _ => false,
        }
    }

    /// Index the next emitted instruction will get.
    fn next_index(&self) -> i64 {
        (self.code.length() + 1) as i64
    }

    fn consume(&mut self) -> Result<Token, CompileError> {
        let token = self.cursor.advance()?;
        self.diagnostics.token(&token);
        Ok(token)
    }

    fn expect(&mut self, kind: TokenKind, lexeme: &str) -> Result<Token, CompileError> {
        let token = self
            .cursor
            .expect(|t| t.is(kind, lexeme), &format!("'{}'", lexeme))?;
        self.diagnostics.token(&token);
        Ok(token)
    }

    fn separator(&mut self, lexeme: &str) -> Result<Token, CompileError> {
        self.expect(TokenKind::Separator, lexeme)
    }

    fn keyword(&mut self, lexeme: &str) -> Result<Token, CompileError> {
        self.expect(TokenKind::Keyword, lexeme)
    }

    fn operator(&mut self, lexeme: &str) -> Result<Token, CompileError> {
        self.expect(TokenKind::Operator, lexeme)
    }

    fn identifier(&mut self) -> Result<Token, CompileError> {
        let token = self
            .cursor
            .expect(|t| t.kind == TokenKind::Identifier, "identifier")?;
        self.diagnostics.token(&token);
        Ok(token)
    }
}

fn require_integer(operator: &Token, found: Type) -> Result<(), CompileError> {
    if found == Type::Integer {
        return Ok(());
    }
    Err(CompileError::TypeMismatch {
        lexeme: operator.lexeme.clone(),
        line: operator.line,
        expected: Type::Integer,
        found,
    })
}

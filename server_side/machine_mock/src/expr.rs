//! Values of g-code words: plain numbers, parameter references and bracketed
//! arithmetic.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parameter<'a> {
    Named(&'a str),
    Numbered(i64),
}

struct Evaluator<'a, F> {
    input: &'a str,
    lookup: F,
}

impl<'a, F: FnMut(Parameter<'_>) -> Result<f64, String>> Evaluator<'a, F> {
    fn skip_space(&mut self) {
        self.input = self.input.trim_start();
    }
    fn eat(&mut self, c: char) -> bool {
        self.skip_space();
        match self.input.strip_prefix(c) {
            Some(rest) => {
                self.input = rest;
                true
            }
            None => false,
        }
    }
    fn expression(&mut self) -> Result<f64, String> {
        let mut value = self.term()?;
        loop {
            if self.eat('+') {
                value += self.term()?;
            } else if self.eat('-') {
                value -= self.term()?;
            } else {
                return Ok(value);
            }
        }
    }
    fn term(&mut self) -> Result<f64, String> {
        let mut value = self.factor()?;
        loop {
            if self.eat('*') {
                value *= self.factor()?;
            } else if self.eat('/') {
                let divisor = self.factor()?;
                if divisor == 0.0 {
                    return Err("division by zero".to_string());
                }
                value /= divisor;
            } else {
                return Ok(value);
            }
        }
    }
    fn factor(&mut self) -> Result<f64, String> {
        if self.eat('-') {
            return Ok(-self.factor()?);
        }
        if self.eat('+') {
            return self.factor();
        }
        if self.eat('[') {
            let value = self.expression()?;
            if !self.eat(']') {
                return Err("unclosed '['".to_string());
            }
            return Ok(value);
        }
        if self.eat('#') {
            return self.parameter();
        }
        self.number()
    }
    fn parameter(&mut self) -> Result<f64, String> {
        if self.eat('<') {
            let (name, rest) = self.input.split_once('>').ok_or("unclosed '<'")?;
            self.input = rest;
            return (self.lookup)(Parameter::Named(name.trim()));
        }
        let number = self.factor()?;
        if number.fract() != 0.0 {
            return Err(format!("parameter number {} is not an integer", number));
        }
        (self.lookup)(Parameter::Numbered(number as i64))
    }
    fn number(&mut self) -> Result<f64, String> {
        self.skip_space();
        let end = self.input.find(|c: char| !c.is_ascii_digit() && c != '.').unwrap_or(self.input.len());
        let (text, rest) = self.input.split_at(end);
        let value = text.parse().map_err(|_| format!("expected a number at {:?}", self.input))?;
        self.input = rest;
        Ok(value)
    }
}

/// Evaluates `input`, resolving parameters through `lookup`.
pub fn evaluate(input: &str, lookup: impl FnMut(Parameter<'_>) -> Result<f64, String>) -> Result<f64, String> {
    let mut evaluator = Evaluator { input, lookup };
    let value = evaluator.expression()?;
    evaluator.skip_space();
    if !evaluator.input.is_empty() {
        return Err(format!("unexpected {:?} in {:?}", evaluator.input, input));
    }
    Ok(value)
}

#[cfg(test)]
pub mod test {
    use super::*;

    fn lookup(parameter: Parameter<'_>) -> Result<f64, String> {
        match parameter {
            Parameter::Named("x") => Ok(2.5),
            Parameter::Numbered(5220) => Ok(1.0),
            Parameter::Numbered(5223) => Ok(-40.0),
            Parameter::Numbered(5210 | 5213) => Ok(0.0),
            other => Err(format!("unknown {:?}", other)),
        }
    }

    #[test]
    pub fn test_numbers() {
        assert_eq!(evaluate("12.5", lookup), Ok(12.5));
        assert_eq!(evaluate("-3", lookup), Ok(-3.0));
        assert_eq!(evaluate("[1 + 2 * 3]", lookup), Ok(7.0));
        assert_eq!(evaluate("[8 - -2] / 4", lookup), Ok(2.5));
    }

    #[test]
    pub fn test_parameters() {
        assert_eq!(evaluate("#<x>", lookup), Ok(2.5));
        assert_eq!(evaluate("[#[5203 + #5220 * 20] + #5213 * #5210]", lookup), Ok(-40.0));
        assert!(evaluate("#<y>", lookup).is_err());
        assert!(evaluate("#1.5", lookup).is_err());
    }

    #[test]
    pub fn test_malformed() {
        assert!(evaluate("[1 + 2", lookup).is_err());
        assert!(evaluate("1 2", lookup).is_err());
        assert!(evaluate("", lookup).is_err());
        assert!(evaluate("1 / 0", lookup).is_err());
    }
}

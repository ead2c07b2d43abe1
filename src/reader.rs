// ABOUTME: The reader: turns source text into Value forms. Built with nom
// ABOUTME: combinators in the same style as the interpreter's original
// ABOUTME: parser, extended with radix-prefixed integers, character
// ABOUTME: literals, bar-quoted symbols and rank-n array literals.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, digit1, multispace1, none_of, one_of},
    combinator::{map, opt, recognize, value},
    multi::many0,
    sequence::preceded,
    IResult, Parser,
};

use crate::error::EvalError;
use crate::value::Value;

fn line_comment(input: &str) -> IResult<&str, ()> {
    value((), (char(';'), take_while(|c| c != '\n'))).parse(input)
}

fn whitespace(input: &str) -> IResult<&str, ()> {
    value((), many0(alt((value((), multispace1), line_comment)))).parse(input)
}

fn symbol_char(c: char) -> bool {
    !c.is_whitespace() && !"()'`,\";|#".contains(c)
}

fn parse_radix_integer(input: &str) -> IResult<&str, Value> {
    let (input, radix) = alt((value(2u32, tag("#b")), value(8u32, tag("#o")), value(16u32, tag("#x")))).parse(input)?;
    let (input, sign) = opt(one_of("+-")).parse(input)?;
    let (input, digits) = take_while1(|c: char| c.is_digit(radix))(input)?;
    let magnitude = i64::from_str_radix(digits, radix).unwrap_or(0);
    let n = if sign == Some('-') { -magnitude } else { magnitude };
    Ok((input, Value::Integer(n)))
}

fn parse_number(input: &str) -> IResult<&str, Value> {
    let (input, sign) = opt(one_of("+-")).parse(input)?;
    let (input, int_part) = digit1(input)?;
    let (input, frac) = opt(preceded(char('.'), digit1)).parse(input)?;
    let (input, exp) = opt((one_of("eE"), opt(one_of("+-")), digit1)).parse(input)?;

    let mut text = String::new();
    if let Some(s) = sign {
        text.push(s);
    }
    text.push_str(int_part);
    if let Some(f) = frac {
        text.push('.');
        text.push_str(f);
    }
    if let Some((e, esign, edigits)) = exp {
        text.push(e);
        if let Some(es) = esign {
            text.push(es);
        }
        text.push_str(edigits);
    }

    if frac.is_some() || exp.is_some() {
        Ok((input, Value::Float(text.parse().unwrap_or(0.0))))
    } else {
        Ok((input, Value::Integer(text.parse().unwrap_or(0))))
    }
}

fn parse_character(input: &str) -> IResult<&str, Value> {
    let (input, _) = tag("#\\")(input)?;
    alt((
        map(tag("space"), |_| Value::Character(' ')),
        map(tag("newline"), |_| Value::Character('\n')),
        map(tag("tab"), |_| Value::Character('\t')),
        map(nom::character::complete::anychar, Value::Character),
    ))
    .parse(input)
}

fn parse_string(input: &str) -> IResult<&str, Value> {
    let (input, _) = char('"')(input)?;
    let mut result = String::new();
    let mut rest = input;
    loop {
        match rest.chars().next() {
            None => break,
            Some('"') => {
                rest = &rest[1..];
                break;
            }
            Some('\\') => {
                let mut chars = rest[1..].chars();
                if let Some(escaped) = chars.next() {
                    result.push(match escaped {
                        'n' => '\n',
                        't' => '\t',
                        'r' => '\r',
                        other => other,
                    });
                    rest = chars.as_str();
                } else {
                    rest = &rest[1..];
                }
            }
            Some(c) => {
                result.push(c);
                rest = &rest[c.len_utf8()..];
            }
        }
    }
    Ok((rest, Value::string(result)))
}

fn parse_bar_symbol(input: &str) -> IResult<&str, Value> {
    let (input, _) = char('|')(input)?;
    let (input, content) = take_while(|c| c != '|')(input)?;
    let (input, _) = char('|')(input)?;
    Ok((input, Value::symbol(content)))
}

fn parse_bare_symbol(input: &str) -> IResult<&str, Value> {
    let (input, text) = recognize(take_while1(symbol_char)).parse(input)?;
    Ok((input, Value::symbol(text)))
}

fn parse_atom(input: &str) -> IResult<&str, Value> {
    alt((
        parse_radix_integer,
        parse_number,
        parse_character,
        parse_string,
        parse_bar_symbol,
        parse_bare_symbol,
    ))
    .parse(input)
}

fn parse_quote_like(input: &str) -> IResult<&str, Value> {
    let (input, (marker, form)) = (
        alt((
            value("quote", char('\'')),
            value("quasiquote", char('`')),
            value("unquote-splicing", tag(",@")),
            value("unquote", char(',')),
            value("function", tag("#'")),
        )),
        preceded(whitespace, parse_form),
    )
        .parse(input)?;
    Ok((input, Value::list(vec![Value::symbol(marker), form])))
}

fn parse_vector(input: &str) -> IResult<&str, Value> {
    let (input, _) = tag("#(")(input)?;
    let (input, items) = many0(preceded(whitespace, parse_form)).parse(input)?;
    let (input, _) = preceded(whitespace, char(')')).parse(input)?;
    Ok((input, Value::vector(items)))
}

fn parse_list(input: &str) -> IResult<&str, Value> {
    let (input, _) = char('(')(input)?;
    let (input, items) = many0(preceded(whitespace, parse_form)).parse(input)?;
    let (input, dotted) = opt(preceded(
        (whitespace, char('.'), whitespace),
        parse_form,
    ))
    .parse(input)?;
    let (input, _) = preceded(whitespace, char(')')).parse(input)?;

    let tail = dotted.unwrap_or(Value::Null);
    let mut result = tail;
    for item in items.into_iter().rev() {
        result = Value::cons(item, result);
    }
    Ok((input, result))
}

fn parse_form(input: &str) -> IResult<&str, Value> {
    alt((parse_quote_like, parse_vector, parse_list, parse_atom)).parse(input)
}

/// Reads a single top-level form from `src`, ignoring leading/trailing
/// whitespace and comments. Returns `Err` if `src` contains no form or the
/// form is malformed.
pub fn read_one(src: &str) -> Result<Value, EvalError> {
    let (rest, _) = whitespace(src).map_err(|e| EvalError::ReadError(e.to_string()))?;
    let (rest, form) = parse_form(rest).map_err(|e| EvalError::ReadError(e.to_string()))?;
    let _ = rest;
    Ok(form)
}

/// Reads every top-level form in `src` in order.
pub fn read_all(src: &str) -> Result<Vec<Value>, EvalError> {
    let mut forms = Vec::new();
    let mut rest = src;
    loop {
        let (next, _) = whitespace(rest).map_err(|e| EvalError::ReadError(e.to_string()))?;
        if next.trim().is_empty() {
            break;
        }
        let (next, form) = parse_form(next).map_err(|e| EvalError::ReadError(e.to_string()))?;
        forms.push(form);
        rest = next;
    }
    Ok(forms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_integer() {
        match read_one("42").unwrap() {
            Value::Integer(n) => assert_eq!(n, 42),
            other => panic!("expected Integer(42), got {other}"),
        }
    }

    #[test]
    fn reads_negative_float() {
        match read_one("-2.5").unwrap() {
            Value::Float(x) => assert_eq!(x, -2.5),
            other => panic!("expected Float(-2.5), got {other}"),
        }
    }

    #[test]
    fn reads_radix_prefixed_integer() {
        match read_one("#xFF").unwrap() {
            Value::Integer(n) => assert_eq!(n, 255),
            other => panic!("expected Integer(255), got {other}"),
        }
    }

    #[test]
    fn reads_character_literal() {
        match read_one("#\\a").unwrap() {
            Value::Character(c) => assert_eq!(c, 'a'),
            other => panic!("expected Character('a'), got {other}"),
        }
    }

    #[test]
    fn reads_named_character_literals() {
        match read_one("#\\space").unwrap() {
            Value::Character(c) => assert_eq!(c, ' '),
            other => panic!("expected Character(' '), got {other}"),
        }
    }

    #[test]
    fn reads_string_with_escapes() {
        match read_one("\"a\\nb\"").unwrap() {
            Value::String(s) => assert_eq!(*s.borrow(), "a\nb"),
            other => panic!("expected a string, got {other}"),
        }
    }

    #[test]
    fn reads_dotted_pair() {
        let form = read_one("(a . b)").unwrap();
        assert!(!form.cdr().unwrap().is_cons());
    }

    #[test]
    fn reads_proper_list_length_two_for_dotted_three() {
        let form = read_one("(a b . c)").unwrap();
        assert_eq!(form.iter_list().count(), 2);
    }

    #[test]
    fn reads_quote_shorthand() {
        let form = read_one("'(a b)").unwrap();
        let items = form.to_vec().unwrap();
        assert_eq!(items.len(), 2);
        match &items[0] {
            Value::Symbol(s) => assert_eq!(s.name(), "quote"),
            other => panic!("expected quote symbol, got {other}"),
        }
    }

    #[test]
    fn reads_vector_literal() {
        let form = read_one("#(1 2 3)").unwrap();
        match form {
            Value::Vector(v) => assert_eq!(v.borrow().len(), 3),
            other => panic!("expected a vector, got {other}"),
        }
    }

    #[test]
    fn reads_bar_quoted_symbol_with_special_chars() {
        match read_one("|hello world|").unwrap() {
            Value::Symbol(s) => assert_eq!(s.name(), "hello world"),
            other => panic!("expected a symbol, got {other}"),
        }
    }

    #[test]
    fn reads_multiple_top_level_forms() {
        let forms = read_all("1 2 3").unwrap();
        assert_eq!(forms.len(), 3);
    }
}

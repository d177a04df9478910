// Built-in functions: BigEndian, LittleEndian, Printf

use crate::error::{ErrorKind, TemplateError};
use crate::span::Span;

use super::types::TypeDescriptor;
use super::value::{Scalar, Value};
use super::Interpreter;

/// The built-in function set, pre-registered in every run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    BigEndian,
    LittleEndian,
    Printf,
}

pub(crate) const ALL: &[Builtin] = &[Builtin::BigEndian, Builtin::LittleEndian, Builtin::Printf];

impl Builtin {
    pub fn name(&self) -> &'static str {
        match self {
            Builtin::BigEndian => "BigEndian",
            Builtin::LittleEndian => "LittleEndian",
            Builtin::Printf => "Printf",
        }
    }
}

/// Invoke a builtin with the raw evaluated argument list.
pub(crate) fn dispatch(
    interp: &mut Interpreter<'_>,
    builtin: Builtin,
    args: &[(TypeDescriptor, Value, Span)],
    span: Span,
) -> Result<(TypeDescriptor, Value), TemplateError> {
    match builtin {
        Builtin::BigEndian | Builtin::LittleEndian => {
            if !args.is_empty() {
                return Err(interp.make_error(
                    ErrorKind::TypeMismatch,
                    format!("{}() takes no arguments", builtin.name()),
                    span,
                ));
            }
            interp.big_endian = builtin == Builtin::BigEndian;
            Ok(void_result())
        }
        Builtin::Printf => {
            let Some((fmt_ty, fmt_value, fmt_span)) = args.first() else {
                return Err(interp.make_error(
                    ErrorKind::TypeMismatch,
                    "Printf requires a format string",
                    span,
                ));
            };
            let fmt = match interp.read_scalar(fmt_ty, fmt_value, *fmt_span)? {
                Scalar::Str(s) => s,
                _ => {
                    return Err(interp.make_error(
                        ErrorKind::TypeMismatch,
                        "Printf format must be a string",
                        *fmt_span,
                    ));
                }
            };
            let mut scalars = Vec::with_capacity(args.len() - 1);
            for (ty, value, arg_span) in &args[1..] {
                scalars.push(interp.read_scalar(ty, value, *arg_span)?);
            }
            let text = format_printf(&fmt, &scalars)
                .map_err(|msg| interp.make_error(ErrorKind::TypeMismatch, msg, span))?;
            interp.host.print(&text);
            Ok(void_result())
        }
    }
}

fn void_result() -> (TypeDescriptor, Value) {
    (TypeDescriptor::void(), Value::constant(Scalar::Int(0)))
}

/// C-style formatter for `Printf`. Supported specifiers: `%d`, `%u`,
/// `%x`, `%X`, `%s`, `%f`, `%%`.
pub(crate) fn format_printf(fmt: &str, args: &[Scalar]) -> Result<String, String> {
    let mut out = String::with_capacity(fmt.len());
    let mut chars = fmt.chars();
    let mut next_arg = 0usize;

    let take = |next_arg: &mut usize| -> Result<Scalar, String> {
        let arg = args
            .get(*next_arg)
            .cloned()
            .ok_or_else(|| "Printf has more format specifiers than arguments".to_string())?;
        *next_arg += 1;
        Ok(arg)
    };

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('%') => out.push('%'),
            Some('d') => match take(&mut next_arg)? {
                Scalar::Int(v) => out.push_str(&v.to_string()),
                Scalar::Float(v) => out.push_str(&(v as i64).to_string()),
                Scalar::Str(_) => return Err("%d requires a numeric argument".into()),
            },
            Some('u') => match take(&mut next_arg)? {
                Scalar::Int(v) => out.push_str(&(v as u64).to_string()),
                Scalar::Float(v) => out.push_str(&(v as u64).to_string()),
                Scalar::Str(_) => return Err("%u requires a numeric argument".into()),
            },
            Some('x') => match take(&mut next_arg)? {
                Scalar::Int(v) => out.push_str(&format!("{:x}", v as u64)),
                _ => return Err("%x requires an integer argument".into()),
            },
            Some('X') => match take(&mut next_arg)? {
                Scalar::Int(v) => out.push_str(&format!("{:X}", v as u64)),
                _ => return Err("%X requires an integer argument".into()),
            },
            Some('s') => {
                let arg = take(&mut next_arg)?;
                out.push_str(&arg.to_display_string());
            }
            Some('f') => match take(&mut next_arg)? {
                Scalar::Float(v) => out.push_str(&format!("{:.6}", v)),
                Scalar::Int(v) => out.push_str(&format!("{:.6}", v as f64)),
                Scalar::Str(_) => return Err("%f requires a numeric argument".into()),
            },
            Some(other) => return Err(format!("unknown format specifier '%{}'", other)),
            None => return Err("format string ends with a bare '%'".into()),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_printf_plain() {
        assert_eq!(format_printf("hello", &[]).unwrap(), "hello");
    }

    #[test]
    fn test_printf_decimal() {
        assert_eq!(
            format_printf("n=%d", &[Scalar::Int(-5)]).unwrap(),
            "n=-5"
        );
    }

    #[test]
    fn test_printf_unsigned_and_hex() {
        assert_eq!(
            format_printf("%u %x %X", &[
                Scalar::Int(-1),
                Scalar::Int(255),
                Scalar::Int(255)
            ])
            .unwrap(),
            "18446744073709551615 ff FF"
        );
    }

    #[test]
    fn test_printf_string() {
        assert_eq!(
            format_printf("%s!", &[Scalar::Str("hi".into())]).unwrap(),
            "hi!"
        );
    }

    #[test]
    fn test_printf_string_accepts_numbers() {
        assert_eq!(format_printf("%s", &[Scalar::Int(9)]).unwrap(), "9");
    }

    #[test]
    fn test_printf_float() {
        assert_eq!(
            format_printf("%f", &[Scalar::Float(1.5)]).unwrap(),
            "1.500000"
        );
    }

    #[test]
    fn test_printf_percent_escape() {
        assert_eq!(format_printf("100%%", &[]).unwrap(), "100%");
    }

    #[test]
    fn test_printf_too_few_args() {
        assert!(format_printf("%d %d", &[Scalar::Int(1)]).is_err());
    }

    #[test]
    fn test_printf_unknown_specifier() {
        assert!(format_printf("%q", &[Scalar::Int(1)]).is_err());
    }

    #[test]
    fn test_printf_type_errors() {
        assert!(format_printf("%d", &[Scalar::Str("x".into())]).is_err());
        assert!(format_printf("%x", &[Scalar::Float(1.0)]).is_err());
    }

    #[test]
    fn test_builtin_names() {
        assert_eq!(Builtin::BigEndian.name(), "BigEndian");
        assert_eq!(Builtin::LittleEndian.name(), "LittleEndian");
        assert_eq!(Builtin::Printf.name(), "Printf");
    }
}

use crate::tensor::{Dims, Tensor, Tensor1, Tensor2};
use std::fmt::{Debug, Formatter, Write};

fn fmt_separated<I, T>(
    iter: &mut I,
    f: &mut Formatter,
    sep: &str,
    fmt: &mut impl FnMut(T, &mut Formatter) -> std::fmt::Result,
    limit: usize,
) -> std::fmt::Result
where
    I: Iterator<Item = T>,
{
    let mut remaining = limit;
    let mut first = true;
    while remaining > 0 {
        let Some(el) = iter.next() else { break };
        if first {
            first = false;
        } else {
            f.write_str(sep)?;
        }
        fmt(el, f)?;
        remaining -= 1;
    }
    Ok(())
}

fn fmt_separated_max<I, T>(
    mut iter: I,
    len: usize,
    max: usize,
    f: &mut Formatter,
    sep: &str,
    fmt: &mut impl FnMut(T, &mut Formatter) -> std::fmt::Result,
) -> std::fmt::Result
where
    I: Iterator<Item = T>,
{
    if len > max {
        let limit = max / 2;
        let to_skip = len - (limit * 2);
        fmt_separated(&mut iter, f, sep, fmt, limit)?;
        f.write_str(sep)?;
        write!(f, "...({to_skip} hidden)")?;
        f.write_str(sep)?;
        iter.nth(to_skip - 1);
        fmt_separated(&mut iter, f, sep, fmt, limit)
    } else {
        fmt_separated(&mut iter, f, sep, fmt, len)
    }
}

const DEBUG_LIMIT_DIM_OUTER: usize = 5;
const DEBUG_LIMIT_DIM_INNER: usize = 10;

fn fmt_row<T: Debug>(row: &[T], f: &mut Formatter) -> std::fmt::Result {
    f.write_char('[')?;
    fmt_separated_max(row.iter(), row.len(), DEBUG_LIMIT_DIM_INNER, f, ", ", &mut |el, f| {
        Debug::fmt(el, f)
    })?;
    f.write_char(']')
}

fn fmt_suffix<T, D: Dims>(t: &Tensor<T, D>, f: &mut Formatter) -> std::fmt::Result {
    write!(
        f,
        " dtype={} dims={} len={}",
        std::any::type_name::<T>(),
        t.dims(),
        t.len()
    )
}

impl<T: Debug> Debug for Tensor1<T> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        fmt_row(self.as_ref(), f)?;
        fmt_suffix(self, f)
    }
}

impl<T: Debug> Debug for Tensor2<T> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        f.write_char('[')?;
        if !self.is_empty() {
            f.write_str("\n   ")?;
            fmt_separated_max(
                self.iter_rows(),
                self.rows(),
                DEBUG_LIMIT_DIM_OUTER,
                f,
                ",\n   ",
                &mut |row, f| fmt_row(row, f),
            )?;
            f.write_char('\n')?;
        }
        f.write_char(']')?;
        fmt_suffix(self, f)
    }
}

use crate::error::PageError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageContext {
    page_number: usize,
    page_count: usize,
}

impl PageContext {
    pub fn new(page_number: usize, page_count: usize) -> Result<Self, PageError> {
        if page_number == 0 {
            return Err(PageError::InvalidConfiguration(
                "page numbers start at 1".to_string(),
            ));
        }
        if page_number > page_count {
            return Err(PageError::InvalidConfiguration(format!(
                "page {} of {}",
                page_number, page_count
            )));
        }
        Ok(Self {
            page_number,
            page_count,
        })
    }

    pub fn page_number(&self) -> usize {
        self.page_number
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_are_one_based_and_bounded() {
        let ctx = PageContext::new(2, 3).expect("valid");
        assert_eq!((ctx.page_number(), ctx.page_count()), (2, 3));
        assert!(PageContext::new(0, 3).is_err());
        assert!(PageContext::new(4, 3).is_err());
    }
}

//! Human-readable stock report.

use core::fmt;

use shopfloor_products::Product;

/// Text rendering of a store's products, one line per product.
///
/// An empty store renders as a single line saying so.
#[derive(Debug, Clone, Copy)]
pub struct ProductListing<'a> {
    products: &'a [Product],
}

impl<'a> ProductListing<'a> {
    pub(crate) fn new(products: &'a [Product]) -> Self {
        Self { products }
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

impl fmt::Display for ProductListing<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.products.is_empty() {
            return writeln!(f, "Магазин пуст.");
        }
        writeln!(f, "Доступные товары:")?;
        for product in self.products {
            writeln!(
                f,
                "- {}: цена {}, на складе: {}",
                product.name(),
                product.price(),
                product.stock()
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_listing() {
        let listing = ProductListing::new(&[]);
        assert!(listing.is_empty());
        assert_eq!(listing.to_string(), "Магазин пуст.\n");
    }

    #[test]
    fn listing_has_header_and_one_line_per_product() {
        let products = vec![
            Product::new("Ноутбук", 1000, 5).unwrap(),
            Product::new("Смартфон", 500, 10).unwrap(),
        ];
        let listing = ProductListing::new(&products);
        assert_eq!(
            listing.to_string(),
            "Доступные товары:\n\
             - Ноутбук: цена 1000, на складе: 5\n\
             - Смартфон: цена 500, на складе: 10\n"
        );
    }
}

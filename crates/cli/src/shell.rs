//! Text menu over a [`Store`].
//!
//! Generic over its input and output so tests can script a session.

use std::io::{self, BufRead, Write};
use std::rc::Rc;

use storefront_store::{OrderLine, SharedProduct, Store};

const MENU_WIDTH: usize = 40;

/// Quantities picked so far in an order that has not been placed yet.
#[derive(Debug, Default)]
struct Basket {
    entries: Vec<(SharedProduct, i64)>,
}

impl Basket {
    fn reserved(&self, product: &SharedProduct) -> i64 {
        self.entries
            .iter()
            .find(|(p, _)| Rc::ptr_eq(p, product))
            .map_or(0, |(_, quantity)| *quantity)
    }

    /// Reserve `quantity` more units. `None` if the reservation would overflow.
    fn add(&mut self, product: &SharedProduct, quantity: i64) -> Option<()> {
        match self.entries.iter_mut().find(|(p, _)| Rc::ptr_eq(p, product)) {
            Some((_, reserved)) => *reserved = reserved.checked_add(quantity)?,
            None => self.entries.push((Rc::clone(product), quantity)),
        }
        Some(())
    }

    /// Units still available for `product`, or `None` when it has no stock limit.
    fn remaining(&self, product: &SharedProduct) -> Option<i64> {
        let p = product.borrow();
        p.kind()
            .tracks_stock()
            .then(|| p.quantity() - self.reserved(product))
    }

    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn lines(&self) -> Vec<OrderLine> {
        self.entries
            .iter()
            .map(|(product, quantity)| OrderLine::new(product, *quantity))
            .collect()
    }
}

pub struct Shell<'a, R, W> {
    store: &'a Store,
    input: R,
    output: W,
}

impl<'a, R: BufRead, W: Write> Shell<'a, R, W> {
    pub fn new(store: &'a Store, input: R, output: W) -> Self {
        Self {
            store,
            input,
            output,
        }
    }

    /// Run the menu loop until the user quits or input ends.
    pub fn run(&mut self) -> io::Result<()> {
        self.print_menu()?;
        loop {
            let Some(choice) = self.prompt("\nPlease choose a number: ")? else {
                break;
            };
            match choice.as_str() {
                "1" => self.list_products()?,
                "2" => self.show_total_quantity()?,
                "3" => self.make_order()?,
                "4" => {
                    writeln!(self.output, "GOODBYE!")?;
                    break;
                }
                _ => {
                    writeln!(self.output, "Invalid choice, please try again.")?;
                    continue;
                }
            }
            if self.prompt("\nPress ENTER to get back to the MENU.")?.is_none() {
                break;
            }
            writeln!(self.output)?;
            self.print_menu()?;
        }
        self.output.flush()
    }

    pub fn into_output(self) -> W {
        self.output
    }

    fn print_menu(&mut self) -> io::Result<()> {
        let border = "*".repeat(MENU_WIDTH);
        writeln!(self.output, "{border}")?;
        writeln!(self.output, "*{:^width$}*", "STORE MENU", width = MENU_WIDTH - 2)?;
        writeln!(self.output, "*{:^width$}*", "----------", width = MENU_WIDTH - 2)?;
        for option in [
            "1. List all products in store",
            "2. Show total amount in store",
            "3. Make an order",
            "4. Quit",
        ] {
            writeln!(self.output, "* {:<width$}*", option, width = MENU_WIDTH - 3)?;
        }
        writeln!(self.output, "{border}")
    }

    fn list_products(&mut self) -> io::Result<()> {
        let active = self.store.list_active();
        if active.is_empty() {
            return self.banner("EVERYTHING IS SOLD OUT!");
        }
        writeln!(self.output, "------")?;
        for (i, product) in active.iter().enumerate() {
            writeln!(self.output, "{}. {}", i + 1, product.borrow().describe())?;
        }
        writeln!(self.output, "------")
    }

    fn show_total_quantity(&mut self) -> io::Result<()> {
        writeln!(
            self.output,
            "Total of {} items in store.",
            self.store.total_quantity()
        )
    }

    fn make_order(&mut self) -> io::Result<()> {
        writeln!(self.output, "\nTo FINISH your order, press ENTER.")?;
        writeln!(self.output, "To CANCEL your order, enter 'q'.")?;

        let mut basket = Basket::default();
        loop {
            let available: Vec<SharedProduct> = self
                .store
                .list_active()
                .into_iter()
                .filter(|p| basket.remaining(p).is_none_or(|left| left > 0))
                .collect();
            if available.is_empty() {
                self.banner("EVERYTHING IS SOLD OUT!")?;
                break;
            }

            writeln!(self.output, "------")?;
            for (i, product) in available.iter().enumerate() {
                let reserved = basket.reserved(product);
                let description = product.borrow().describe();
                if reserved > 0 {
                    writeln!(self.output, "{}. {description} (in order: {reserved})", i + 1)?;
                } else {
                    writeln!(self.output, "{}. {description}", i + 1)?;
                }
            }
            writeln!(self.output, "------")?;

            let Some(pick) = self.prompt("\nEnter the product # you want: ")? else {
                return self.cancel_order();
            };
            if pick.is_empty() {
                break;
            }
            if pick.eq_ignore_ascii_case("q") {
                return self.cancel_order();
            }
            let product = match pick.parse::<usize>() {
                Ok(n) if (1..=available.len()).contains(&n) => Rc::clone(&available[n - 1]),
                _ => {
                    writeln!(self.output, "Invalid choice. Try again.")?;
                    continue;
                }
            };

            match self.ask_amount(&basket, &product)? {
                AmountAnswer::Amount(amount) => {
                    if basket.add(&product, amount).is_none() {
                        writeln!(self.output, "That amount is too large for one order.")?;
                        continue;
                    }
                }
                AmountAnswer::Skip => continue,
                AmountAnswer::Cancel => return self.cancel_order(),
            }

            match self.store.quote_order(&basket.lines()) {
                Ok(total) => writeln!(self.output, "Current total: {total:.2}")?,
                Err(err) => writeln!(self.output, "Cannot price this order: {err}")?,
            }
            if basket.remaining(&product) == Some(0) {
                let message = format!("{} is now SOLD OUT!", product.borrow().name());
                self.banner(&message)?;
            }
        }

        if basket.is_empty() {
            return writeln!(self.output, "Nothing was ordered.");
        }
        match self.store.place_order(&basket.lines()) {
            Ok(receipt) => {
                let message = format!("Order made! Total payment: {:.2}", receipt.total());
                self.banner(&message)
            }
            Err(failure) => {
                writeln!(self.output, "Error while making order! {failure}")?;
                if !failure.committed().is_empty() {
                    writeln!(
                        self.output,
                        "Charged for the lines before it: {:.2}",
                        failure.committed().total()
                    )?;
                }
                Ok(())
            }
        }
    }

    /// Ask until the amount fits the cap and the stock left after reservations.
    fn ask_amount(&mut self, basket: &Basket, product: &SharedProduct) -> io::Result<AmountAnswer> {
        loop {
            let Some(answer) = self.prompt("Enter the amount you want: ")? else {
                return Ok(AmountAnswer::Cancel);
            };
            if answer.is_empty() {
                return Ok(AmountAnswer::Skip);
            }
            if answer.eq_ignore_ascii_case("q") {
                return Ok(AmountAnswer::Cancel);
            }
            let amount = match answer.parse::<i64>() {
                Ok(n) if n > 0 => n,
                _ => {
                    writeln!(self.output, "Please enter a valid number for the amount.")?;
                    continue;
                }
            };

            let reserved = basket.reserved(product);
            if reserved.checked_add(amount).is_none() {
                writeln!(self.output, "That amount is too large for one order.")?;
                continue;
            }
            if let Some(max) = product.borrow().max_per_order() {
                if reserved + amount > max {
                    writeln!(
                        self.output,
                        "The maximum quantity per order is {max} (already in order: {reserved})."
                    )?;
                    continue;
                }
            }
            if let Some(left) = basket.remaining(product) {
                if amount > left {
                    writeln!(self.output, "Please enter an amount between 1 and {left}.")?;
                    continue;
                }
            }
            return Ok(AmountAnswer::Amount(amount));
        }
    }

    fn cancel_order(&mut self) -> io::Result<()> {
        writeln!(self.output, "ORDER CANCELLED.")
    }

    fn banner(&mut self, message: &str) -> io::Result<()> {
        let border = "*".repeat(message.len() + 4);
        writeln!(self.output, "{border}")?;
        writeln!(self.output, "* {message} *")?;
        writeln!(self.output, "{border}")
    }

    /// `Ok(None)` once input is exhausted.
    fn prompt(&mut self, text: &str) -> io::Result<Option<String>> {
        write!(self.output, "{text}")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}

enum AmountAnswer {
    Amount(i64),
    Skip,
    Cancel,
}

#[cfg(test)]
mod common;



#[cfg(test)]
mod case_update_tests;






#[cfg(test)]
mod item_picture_tests;

#[cfg(test)]
mod routing_tests;

pub mod department;
pub mod faculty;
pub mod funding;
pub mod project;
pub mod publication;
pub mod student;

pub use department::Department;
pub use faculty::Faculty;
pub use funding::{FundingAllocation, FundingSource};
pub use project::Project;
pub use publication::{Publication, PublicationAuthor};
pub use student::Student;
